use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserIntent {
    /// States or refines requirements.
    Demand,
    Compare,
    MoreOptions,
    /// Greetings, thanks, small talk.
    Chat,
}

fn compile(pattern: &str) -> Regex {
    Regex::new(&format!("(?i){}", pattern)).unwrap_or_else(|e| panic!("invalid intent pattern: {}", e))
}

static COMPARE: Lazy<Regex> = Lazy::new(|| {
    compile(r"\b(?:compare|comparison|vs\.?|versus|differences?|which is better|which one is better)\b|对比|比较一下|比较下|比一比|[和跟与].{1,12}比较|哪个比较好|哪款比较好|区别|哪个好|哪款好")
});
static MORE_OPTIONS: Lazy<Regex> = Lazy::new(|| {
    compile(r"\b(?:other options|more options|something else|anything else|alternatives?|show me more|any others|others)\b|^\s*more\s*[.!?]?\s*$|换一|其他|别的|还有吗|更多")
});
static CHAT: Lazy<Regex> = Lazy::new(|| {
    compile(r"^\s*(?:hi|hello|hey|thanks|thank you|thx|ok|okay|cool|great|bye|good (?:morning|afternoon|evening)|how are you|who are you)\b|^\s*(?:你好|您好|谢谢|嗨|好的|再见|你是谁)")
});

/// Rule-first classification. `hint` from the model is consulted only when the
/// rules fall through to `Demand` and the message itself carried no demand.
pub fn classify(text: &str, carried_demand: bool, hint: Option<UserIntent>) -> UserIntent {
    if COMPARE.is_match(text) {
        return UserIntent::Compare;
    }
    if MORE_OPTIONS.is_match(text) {
        return UserIntent::MoreOptions;
    }
    if !carried_demand && CHAT.is_match(text) {
        return UserIntent::Chat;
    }
    match hint {
        Some(hinted) if !carried_demand => hinted,
        _ => UserIntent::Demand,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compare_and_more_options() {
        assert_eq!(classify("compare the first two", false, None), UserIntent::Compare);
        assert_eq!(classify("Xiaomi 13 vs iPhone 14?", false, None), UserIntent::Compare);
        assert_eq!(classify("这几款对比一下", false, None), UserIntent::Compare);
        assert_eq!(classify("比较一下这几款", false, None), UserIntent::Compare);
        assert_eq!(classify("小米13和iPhone 14比较呢", false, None), UserIntent::Compare);
        assert_eq!(classify("any other options?", false, None), UserIntent::MoreOptions);
        assert_eq!(classify("换一批", false, None), UserIntent::MoreOptions);
    }

    #[test]
    fn fairly_as_an_adverb_is_not_a_comparison() {
        assert_eq!(classify("预算3000-4000，比较看重拍照和续航", true, None), UserIntent::Demand);
        assert_eq!(classify("夜景拍摄比较多", true, None), UserIntent::Demand);
        assert_eq!(classify("我比较喜欢轻薄的", true, None), UserIntent::Demand);
    }

    #[test]
    fn greetings_without_demand_are_chat() {
        assert_eq!(classify("hello!", false, None), UserIntent::Chat);
        assert_eq!(classify("谢谢", false, None), UserIntent::Chat);
        assert_eq!(classify("hi, I need a camera phone", true, None), UserIntent::Demand);
    }

    #[test]
    fn hint_only_fills_gaps() {
        assert_eq!(classify("what do you think", false, Some(UserIntent::Chat)), UserIntent::Chat);
        assert_eq!(classify("good battery", true, Some(UserIntent::Chat)), UserIntent::Demand);
        assert_eq!(classify("compare them", false, Some(UserIntent::Chat)), UserIntent::Compare);
    }
}
