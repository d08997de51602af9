//! Injected vocabularies for the text analyzer, one `Lexicon` per language.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Analysis language, decided per document by script heuristic or post hint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    Zh,
    En,
}

impl Lang {
    pub const ALL: [Lang; 2] = [Lang::Zh, Lang::En];

    pub fn as_str(self) -> &'static str {
        match self {
            Lang::Zh => "zh",
            Lang::En => "en",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Lang::Zh => "Chinese",
            Lang::En => "English",
        }
    }

    /// Parse a language hint such as `"zh"`, `"zh-CN"`, `"en"` or `"english"`.
    pub fn from_hint(hint: &str) -> Option<Lang> {
        let h = hint.trim().to_lowercase();
        if h.starts_with("zh") || h == "chinese" || h == "cn" {
            Some(Lang::Zh)
        } else if h.starts_with("en") {
            Some(Lang::En)
        } else {
            None
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordCategory {
    pub name: String,
    pub keywords: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub name: String,
    pub keywords: Vec<String>,
}

/// Built-in topic names, in report order.
pub const TOPICS: [&str; 6] = [
    "job_replacement",
    "skill_requirements",
    "career_development",
    "ai_tools",
    "industry_impact",
    "emotional_response",
];

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lexicon {
    pub categories: Vec<KeywordCategory>,
    pub positive: Vec<String>,
    pub negative: Vec<String>,
    pub topics: Vec<Topic>,
    pub stopwords: Vec<String>,
    /// Multi-character terms counted as words when contained in the text.
    pub common_phrases: Vec<String>,
}

fn words(xs: &[&str]) -> Vec<String> {
    xs.iter().map(|s| s.to_string()).collect()
}

fn category(name: &str, xs: &[&str]) -> KeywordCategory {
    KeywordCategory { name: name.to_string(), keywords: words(xs) }
}

fn topics(sets: [&[&str]; 6]) -> Vec<Topic> {
    TOPICS
        .iter()
        .zip(sets)
        .map(|(name, kws)| Topic { name: name.to_string(), keywords: words(kws) })
        .collect()
}

impl Lexicon {
    /// An empty lexicon: every category, sentiment and topic result is empty.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn default_for(lang: Lang) -> Self {
        match lang {
            Lang::En => english(),
            Lang::Zh => chinese(),
        }
    }
}

fn english() -> Lexicon {
    Lexicon {
        categories: vec![
            category("ai_technology", &[
                "ai", "artificial intelligence", "machine learning", "deep learning", "neural network",
                "chatgpt", "gpt", "llm", "large language model", "openai", "anthropic", "claude",
                "gemini", "copilot", "github copilot", "cursor", "agent", "agentic",
                "prompt engineering", "vibe coding",
            ]),
            category("job_impact", &[
                "automation", "automate", "replace", "replacement", "job", "jobs", "career",
                "employment", "unemployed", "layoff", "layoffs", "hire", "hiring", "salary",
                "salaries", "income", "market", "industry", "threat", "opportunity", "risk", "impact",
            ]),
            category("skills", &[
                "skill", "skills", "learning", "adapt", "experience", "productivity", "efficiency",
                "coding", "programming", "code", "tool", "tools",
            ]),
            category("roles", &[
                "programmer", "programmers", "developer", "developers", "engineer", "engineers",
                "junior", "senior", "entry level", "mid level",
            ]),
            category("sentiment_vocabulary", &[
                "worry", "worried", "concern", "concerned", "fear", "afraid", "optimistic", "pessimistic",
            ]),
        ],
        positive: words(&[
            "good", "great", "excellent", "amazing", "awesome", "fantastic", "wonderful", "helpful",
            "useful", "beneficial", "opportunity", "opportunities", "advantage", "improve", "better",
            "best", "love", "like", "enjoy", "happy", "excited", "optimistic", "positive", "hope",
            "hopeful", "promising", "success", "successful", "efficient", "productivity",
            "innovative", "creative", "smart", "intelligent", "powerful", "capable", "effective",
            "valuable", "progress", "advance", "growth", "assist", "assistance", "support",
            "enhance", "boost", "augment", "empower",
        ]),
        negative: words(&[
            "bad", "terrible", "awful", "horrible", "worst", "hate", "dislike", "angry", "sad",
            "worried", "worry", "concern", "concerned", "fear", "afraid", "scary", "threat",
            "threaten", "threatening", "danger", "dangerous", "risk", "risky", "replace",
            "replacement", "obsolete", "useless", "worthless", "unemployed", "unemployment",
            "layoff", "layoffs", "fired", "lose", "lost", "losing", "pessimistic", "negative",
            "doom", "doomed", "fail", "failure", "difficult", "hard", "struggle", "struggling",
            "crisis", "problem", "problems", "issue", "issues", "decline", "decrease", "drop",
            "fall", "crash", "collapse",
        ]),
        topics: topics([
            &["replace", "replacement", "obsolete", "automate", "automation", "layoff", "unemployed"],
            &["skill", "skills", "learn", "learning", "adapt", "knowledge", "experience"],
            &["career", "job", "hire", "hiring", "junior", "senior", "entry", "promotion"],
            &["chatgpt", "gpt", "copilot", "claude", "cursor", "tool", "assistant", "llm"],
            &["industry", "market", "company", "tech", "software", "developer", "programmer"],
            &["worry", "fear", "concern", "hope", "optimistic", "pessimistic", "anxious"],
        ]),
        stopwords: words(&[
            "the", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
            "from", "as", "is", "was", "are", "were", "been", "be", "have", "has", "had", "do",
            "does", "did", "will", "would", "could", "should", "may", "might", "must", "shall",
            "can", "need", "used", "you", "he", "she", "it", "we", "they", "me", "him", "her",
            "us", "them", "my", "your", "his", "its", "our", "their", "this", "that", "these",
            "those", "what", "which", "who", "whom", "whose", "when", "where", "why", "how", "all",
            "each", "every", "both", "few", "more", "most", "other", "some", "such", "no", "nor",
            "not", "only", "own", "same", "so", "than", "too", "very", "just", "also", "now",
            "here", "there", "then", "once", "if", "because", "although", "though", "while",
            "until", "unless", "since", "after", "before", "about", "into", "through", "during",
            "above", "below", "between", "under", "again", "further", "any", "am", "being", "get",
            "got", "getting", "going", "go", "goes", "went", "come", "comes", "came", "make",
            "makes", "made", "making", "take", "takes", "took", "see", "saw", "know", "knew",
            "think", "thought", "want", "wanted", "use", "uses", "using", "find", "found", "give",
            "gave", "tell", "told", "work", "works", "worked", "working", "seem", "seems", "feel",
            "felt", "try", "tried", "let", "say", "says", "said", "really", "even", "back",
            "still", "well", "way", "new", "first", "last", "long", "little", "old", "right",
            "big", "high", "different", "small", "large", "next", "early", "able", "don", "ve",
            "re", "ll", "isn", "aren", "wasn", "weren", "hasn", "haven", "doesn", "didn", "won",
            "wouldn", "shouldn", "couldn", "thing", "things", "something", "anything",
            "everything", "nothing", "someone", "anyone", "everyone", "people", "time", "times",
            "year", "years", "day", "days", "lot", "lots", "much", "many", "bit", "yeah", "yes",
            "ok", "okay", "sure", "actually", "probably", "maybe", "already", "yet", "ago",
            "etc",
        ]),
        common_phrases: Vec::new(),
    }
}

fn chinese() -> Lexicon {
    Lexicon {
        categories: vec![
            category("ai_technology", &[
                "ai", "人工智能", "机器学习", "深度学习", "神经网络", "chatgpt", "gpt", "大模型",
                "大语言模型", "openai", "claude", "gemini", "copilot", "提示词", "智能体", "agent",
            ]),
            category("job_impact", &[
                "自动化", "取代", "替代", "淘汰", "工作", "职业", "就业", "失业", "裁员", "招聘",
                "薪资", "收入", "市场", "行业", "威胁", "机会", "风险", "影响", "变革", "转型",
            ]),
            category("skills", &["技能", "学习", "适应", "经验", "效率", "生产力", "工具", "代码", "编程", "开发"]),
            category("roles", &["程序员", "开发者", "工程师", "码农", "初级", "高级", "资深", "35岁", "中年"]),
            category("sentiment_vocabulary", &["担心", "焦虑", "恐惧", "乐观", "悲观", "内卷", "躺平"]),
        ],
        positive: words(&[
            "好", "很好", "非常好", "优秀", "出色", "棒", "厉害", "有用", "有帮助", "有益", "机会",
            "优势", "改善", "提升", "进步", "喜欢", "开心", "兴奋", "乐观", "积极", "希望", "有前途",
            "成功", "高效", "创新", "创造", "强大", "有效", "有价值", "辅助", "支持", "增强", "赋能",
            "解放", "效率",
        ]),
        negative: words(&[
            "差", "糟糕", "可怕", "恐怖", "最差", "讨厌", "生气", "难过", "担心", "担忧", "焦虑",
            "恐惧", "害怕", "威胁", "危险", "风险", "取代", "替代", "淘汰", "过时", "无用", "失业",
            "裁员", "被裁", "失去", "悲观", "消极", "末日", "失败", "困难", "艰难", "挣扎", "危机",
            "问题", "下降", "减少", "崩溃", "内卷", "卷",
        ]),
        topics: topics([
            &["取代", "替代", "淘汰", "自动化", "裁员", "失业"],
            &["技能", "学习", "适应", "知识", "经验", "能力"],
            &["职业", "工作", "招聘", "初级", "高级", "晋升", "发展"],
            &["chatgpt", "gpt", "copilot", "claude", "工具", "助手", "大模型"],
            &["行业", "市场", "公司", "技术", "软件", "开发", "程序员"],
            &["担心", "焦虑", "恐惧", "希望", "乐观", "悲观"],
        ]),
        stopwords: words(&[
            "的", "了", "是", "我", "你", "他", "她", "它", "们", "这", "那", "有", "在", "不",
            "就", "也", "都", "和", "与", "或", "但", "而", "如果", "因为", "所以", "虽然", "但是",
            "可以", "能够", "已经", "正在", "将要", "会", "要", "能", "想", "觉得", "知道", "看",
            "说", "做", "去", "来", "很", "非常", "太", "最", "更", "还", "又", "再", "只", "就是",
            "什么", "怎么", "为什么", "哪", "谁", "多少", "几", "一个", "这个", "那个", "一些",
            "某些", "其他", "自己", "大家", "没有", "不是", "不会", "不能", "没", "吧", "呢", "啊",
            "吗", "呀", "嘛", "哦", "哈",
        ]),
        common_phrases: words(&[
            "人工智能", "机器学习", "深度学习", "大语言模型", "大模型", "程序员", "软件工程师",
            "开发者", "工程师", "就业市场", "求职", "面试", "技术栈", "编程语言", "工作经验",
            "职业发展", "职业规划", "技能提升", "自我提升", "终身学习", "持续学习", "裁员", "失业",
            "内卷", "躺平", "35岁", "中年危机", "转行", "转型", "自动化", "智能化", "数字化",
            "chatgpt", "gpt", "ai", "copilot",
        ]),
    }
}
