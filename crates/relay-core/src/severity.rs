use crate::error::{RelayError, Result};

/// 严重级别排序，下标 0 优先级最高
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeverityRanking {
    severities: Vec<String>,
}

impl SeverityRanking {
    pub fn new(severities: Vec<String>) -> Result<Self> {
        if severities.is_empty() {
            return Err(RelayError::Config("severity list must not be empty".to_string()));
        }

        for (index, severity) in severities.iter().enumerate() {
            if severities[..index].contains(severity) {
                return Err(RelayError::Config(format!(
                    "duplicate severity in list: {}",
                    severity
                )));
            }
        }

        Ok(Self { severities })
    }

    pub fn rank_of(&self, severity: &str) -> Option<usize> {
        self.severities.iter().position(|s| s == severity)
    }

    /// `a` 的优先级是否高于 `b`
    pub fn is_higher_priority(&self, a: &str, b: &str) -> Result<bool> {
        Ok(self.ranked(a)? < self.ranked(b)?)
    }

    pub fn lowest(&self) -> &str {
        self.severities.last().map(String::as_str).unwrap_or_default()
    }

    pub fn severities(&self) -> &[String] {
        &self.severities
    }

    fn ranked(&self, severity: &str) -> Result<usize> {
        self.rank_of(severity)
            .ok_or_else(|| RelayError::UnrankedSeverity(severity.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranking() -> SeverityRanking {
        SeverityRanking::new(vec![
            "critical".to_string(),
            "warning".to_string(),
            "info".to_string(),
        ])
        .unwrap()
    }

    #[test]
    fn test_rank_and_priority() {
        let ranking = ranking();
        assert_eq!(ranking.rank_of("critical"), Some(0));
        assert_eq!(ranking.rank_of("info"), Some(2));
        assert_eq!(ranking.rank_of("unknown"), None);
        assert!(ranking.is_higher_priority("critical", "warning").unwrap());
        assert!(!ranking.is_higher_priority("info", "warning").unwrap());
        assert!(!ranking.is_higher_priority("warning", "warning").unwrap());
        assert_eq!(ranking.lowest(), "info");
    }

    #[test]
    fn test_unranked_severity_is_error() {
        let result = ranking().is_higher_priority("unknown", "info");
        assert!(matches!(result, Err(RelayError::UnrankedSeverity(ref s)) if s == "unknown"));
    }

    #[test]
    fn test_invalid_rankings() {
        assert!(SeverityRanking::new(vec![]).is_err());
        assert!(SeverityRanking::new(vec!["a".to_string(), "a".to_string()]).is_err());
    }
}
