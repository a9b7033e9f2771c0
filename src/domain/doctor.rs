use serde::{Deserialize, Serialize};

pub type DoctorId = i64;

/// A medical professional who receives a share of every appointment they bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: DoctorId,
    pub name: String,
    /// Revenue share in percent (20.0 means a fifth of each appointment)
    pub percentage: f64,
}

impl Doctor {
    pub fn new(id: DoctorId, name: impl Into<String>, percentage: f64) -> Self {
        Self {
            id,
            name: name.into(),
            percentage,
        }
    }

    /// Returns true if the name (case-insensitively) contains `query`.
    /// A blank query matches every doctor.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty() || self.name.to_lowercase().contains(&query)
    }
}

/// Normalize a doctor name, returning `None` if nothing is left after trimming.
pub fn normalize_name(name: &str) -> Option<String> {
    let name = name.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Percentages must be finite and non-negative. Values above 100 are accepted.
pub fn is_valid_percentage(percentage: f64) -> bool {
    percentage.is_finite() && percentage >= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Dr. A "), Some("Dr. A".to_string()));
        assert_eq!(normalize_name(""), None);
        assert_eq!(normalize_name("   "), None);
    }

    #[test]
    fn test_percentage_validation() {
        assert!(is_valid_percentage(0.0));
        assert!(is_valid_percentage(20.0));
        assert!(is_valid_percentage(150.0));
        assert!(!is_valid_percentage(-0.5));
        assert!(!is_valid_percentage(f64::NAN));
        assert!(!is_valid_percentage(f64::INFINITY));
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let doctor = Doctor::new(1, "Dr. Ana Souza", 30.0);
        assert!(doctor.matches("ana"));
        assert!(doctor.matches("SOUZA"));
        assert!(doctor.matches("  "));
        assert!(!doctor.matches("carlos"));
    }
}
