//! 语言状态
//!
//! `LanguageCode` 只能从内置注册表构造；`LanguageStore` 保存当前选择的语言，
//! 并负责与持久化存储同步。

use std::fmt;
use std::sync::Mutex;

use crate::translation::config::constants;
use crate::translation::error::{TranslationError, TranslationResult};
use crate::translation::storage::preferences::PreferenceStore;

/// 文字方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextDirection {
    Ltr,
    Rtl,
}

impl TextDirection {
    /// HTML `dir` 属性值
    pub fn as_html(&self) -> &'static str {
        match self {
            TextDirection::Ltr => "ltr",
            TextDirection::Rtl => "rtl",
        }
    }
}

struct LanguageInfo {
    code: &'static str,
    label: &'static str,
    native_label: &'static str,
    direction: TextDirection,
}

/// 支持的语言，按界面显示顺序排列
#[rustfmt::skip]
static LANGUAGES: &[LanguageInfo] = &[
    LanguageInfo { code: "en", label: "English", native_label: "English", direction: TextDirection::Ltr },
    LanguageInfo { code: "hi", label: "Hindi", native_label: "हिन्दी", direction: TextDirection::Ltr },
    LanguageInfo { code: "mr", label: "Marathi", native_label: "मराठी", direction: TextDirection::Ltr },
    LanguageInfo { code: "bn", label: "Bengali", native_label: "বাংলা", direction: TextDirection::Ltr },
    LanguageInfo { code: "ta", label: "Tamil", native_label: "தமிழ்", direction: TextDirection::Ltr },
    LanguageInfo { code: "te", label: "Telugu", native_label: "తెలుగు", direction: TextDirection::Ltr },
    LanguageInfo { code: "gu", label: "Gujarati", native_label: "ગુજરાતી", direction: TextDirection::Ltr },
    LanguageInfo { code: "kn", label: "Kannada", native_label: "ಕನ್ನಡ", direction: TextDirection::Ltr },
    LanguageInfo { code: "ml", label: "Malayalam", native_label: "മലയാളം", direction: TextDirection::Ltr },
    LanguageInfo { code: "pa", label: "Punjabi", native_label: "ਪੰਜਾਬੀ", direction: TextDirection::Ltr },
    LanguageInfo { code: "or", label: "Odia", native_label: "ଓଡ଼ିଆ", direction: TextDirection::Ltr },
    LanguageInfo { code: "ur", label: "Urdu", native_label: "اردو", direction: TextDirection::Rtl },
];

/// 经过验证的语言代码
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct LanguageCode {
    index: usize,
}

impl LanguageCode {
    /// 从语言代码创建，大小写与首尾空白不敏感
    pub fn from_code(code: &str) -> TranslationResult<Self> {
        let normalized = code.trim().to_lowercase();
        LANGUAGES
            .iter()
            .position(|info| info.code == normalized)
            .map(|index| Self { index })
            .ok_or_else(|| TranslationError::UnsupportedLanguage(code.to_string()))
    }

    /// 所有支持的语言
    pub fn all() -> impl Iterator<Item = LanguageCode> {
        (0..LANGUAGES.len()).map(|index| LanguageCode { index })
    }

    fn info(&self) -> &'static LanguageInfo {
        &LANGUAGES[self.index]
    }

    pub fn code(&self) -> &'static str {
        self.info().code
    }

    pub fn label(&self) -> &'static str {
        self.info().label
    }

    pub fn native_label(&self) -> &'static str {
        self.info().native_label
    }

    pub fn direction(&self) -> TextDirection {
        self.info().direction
    }

    /// 是否为基准语言（页面原文语言）
    pub fn is_default(&self) -> bool {
        self.code() == constants::DEFAULT_LANGUAGE
    }
}

impl Default for LanguageCode {
    fn default() -> Self {
        LanguageCode::from_code(constants::DEFAULT_LANGUAGE)
            .unwrap_or(LanguageCode { index: 0 })
    }
}

impl fmt::Debug for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LanguageCode({})", self.code())
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for LanguageCode {
    type Err = TranslationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LanguageCode::from_code(s)
    }
}

/// 当前语言与其持久化
pub struct LanguageStore {
    current: Mutex<LanguageCode>,
    preferences: Box<dyn PreferenceStore>,
}

impl LanguageStore {
    /// 创建语言存储，当前语言为默认语言
    pub fn new(preferences: Box<dyn PreferenceStore>) -> Self {
        Self {
            current: Mutex::new(LanguageCode::default()),
            preferences,
        }
    }

    /// 读取已保存的语言
    ///
    /// 只恢复选择本身，不会触发翻译。读取失败或代码无效时回退到默认语言。
    pub fn restore(&self) -> LanguageCode {
        let restored = match self.preferences.load_language() {
            Ok(Some(code)) => match LanguageCode::from_code(&code) {
                Ok(language) => language,
                Err(e) => {
                    tracing::warn!("忽略保存的语言偏好: {}", e);
                    LanguageCode::default()
                }
            },
            Ok(None) => LanguageCode::default(),
            Err(e) => {
                tracing::warn!("读取语言偏好失败，使用默认语言: {}", e);
                LanguageCode::default()
            }
        };

        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = restored;
        tracing::debug!("恢复语言偏好: {}", restored);
        restored
    }

    pub fn current(&self) -> LanguageCode {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 设置当前语言并持久化；持久化失败只记录日志
    pub fn set_current(&self, language: LanguageCode) {
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = language;

        if let Err(e) = self.preferences.save_language(language.code()) {
            tracing::warn!("保存语言偏好失败: {}", e);
        }
    }
}
