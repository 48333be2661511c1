//! Prompt builder.
//!
//! Renders the query text for a date. Output depends on the date alone, so
//! re-running a day submits exactly the same prompt.

use anyhow::{Context, Result};
use std::path::Path;

use crate::domain::models::DateKey;

/// Placeholder replaced by the localized date (`2024년 11월 15일`).
pub const DATE_PLACEHOLDER: &str = "{date}";
/// Placeholder replaced by the ISO date (`2024-11-15`).
pub const ISO_DATE_PLACEHOLDER: &str = "{iso_date}";

const LOCALIZED_DATE_FORMAT: &str = "%Y년 %m월 %d일";

/// Daily crypto community / news analysis request.
const BUILTIN_TEMPLATE: &str = "\
다음 조건에 따라 {date} 하루 동안의 암호화폐 커뮤니티 및 뉴스 흐름을 종합적으로 분석해줘. 데이터는 사실에 기반하여 논리적으로 정리하고, 시장 반응과 정서 변화가 어떻게 연결되는지를 중심으로 설명해줘.
명시되지 않거나 부정확하고 불명확한 데이터는 생략하고, 확인 가능한 데이터만으로 분석을 진행해줘.

[시간 범위]
- {date} (UTC 기준 00:00 ~ 23:59)

[분석 대상 커뮤니티/소스]
- Reddit (cryptocurrency, bitcoin, ethtrader, CryptoMarkets)
- Bitcointalk, Steemit, CryptoCompare Forum 등 주요 암호화폐 커뮤니티

[요청 분석 항목]
1. 해당 하루 동안 커뮤니티에서 가장 많이 언급된 주제/이슈 3가지와 그 배경 (사건, 발표, 뉴스 등)
2. 커뮤니티 전체의 감정 분포 (긍정/부정/혼합) 및 어떤 사건이 어떤 감정을 유도했는지에 대한 해석
3. 주로 언급된 코인 (예: BTC, ETH 등)과 그날의 가격 변동성, 기술적 분석 언급 유무
4. 주요 뉴스 기사, 규제 발표, 해킹 사건 등 외부 요인과 커뮤니티 반응 간의 상관성

[출력 형식]
- [핵심 토픽 요약] (이슈별로 배경, 반응, 여파까지 요약)
- [감정 분석 결과] (주요 감정, 변동 추이 및 대표 인용)
- [주요 인용/밈/반응 예시] (실제 커뮤니티 내 언급 사례)
- [당일 시장 반영 요인] (가격 변화와 커뮤니티 정서 간 인과관계 요약)";

/// Builds the query text for a date from a template.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    template: String,
}

impl PromptBuilder {
    /// Builder using the built-in daily analysis template.
    pub fn builtin() -> Self {
        Self {
            template: BUILTIN_TEMPLATE.to_string(),
        }
    }

    /// Builder using a custom template string.
    pub fn from_template(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Load a template file. Trailing whitespace is dropped so the last
    /// line does not turn into an empty soft break.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let template = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read prompt template {}", path.display()))?;
        if template.trim().is_empty() {
            anyhow::bail!("Prompt template {} is empty", path.display());
        }
        Ok(Self::from_template(template.trim_end()))
    }

    /// Load the configured template, or fall back to the built-in one.
    pub fn from_config(template_path: Option<&Path>) -> Result<Self> {
        template_path.map_or_else(|| Ok(Self::builtin()), Self::from_file)
    }

    /// Raw template text, placeholders unexpanded
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Render the query for `date`.
    pub fn build(&self, date: DateKey) -> String {
        self.template
            .replace(DATE_PLACEHOLDER, &localized_date(date))
            .replace(ISO_DATE_PLACEHOLDER, &date.to_string())
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Date as written in the prompt: `YYYY년 MM월 DD일`.
pub fn localized_date(date: DateKey) -> String {
    date.format(LOCALIZED_DATE_FORMAT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn date() -> DateKey {
        DateKey::from_ymd(2024, 11, 5).unwrap()
    }

    #[test]
    fn test_builtin_prompt_mentions_date_twice() {
        let prompt = PromptBuilder::builtin().build(date());
        assert_eq!(prompt.matches("2024년 11월 05일").count(), 2);
        assert!(!prompt.contains(DATE_PLACEHOLDER));
        assert!(prompt.lines().count() > 10);
    }

    #[test]
    fn test_build_is_deterministic() {
        let builder = PromptBuilder::builtin();
        assert_eq!(builder.build(date()), builder.build(date()));
        assert_ne!(
            builder.build(date()),
            builder.build(date().succ().unwrap())
        );
    }

    #[test]
    fn test_custom_template_placeholders() {
        let builder = PromptBuilder::from_template("Summarize {iso_date} ({date})");
        assert_eq!(
            builder.build(date()),
            "Summarize 2024-11-05 (2024년 11월 05일)"
        );
    }

    #[test]
    fn test_from_file_trims_trailing_newline() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "line one {{iso_date}}\nline two\n").unwrap();
        file.flush().unwrap();

        let builder = PromptBuilder::from_file(file.path()).unwrap();
        assert_eq!(builder.build(date()), "line one 2024-11-05\nline two");
    }

    #[test]
    fn test_from_file_rejects_empty_template() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(PromptBuilder::from_file(file.path()).is_err());
    }

    #[test]
    fn test_from_config_defaults_to_builtin() {
        let builder = PromptBuilder::from_config(None).unwrap();
        assert_eq!(builder.template(), PromptBuilder::builtin().template());
    }
}
