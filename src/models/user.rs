use serde::{Deserialize, Serialize};

/// Text shown in place of any account field the server left empty.
pub const MISSING_FIELD: &str = "정보 없음";

/// Account data as returned by the "current user" endpoint and cached in
/// local storage under the `user` key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub coin: Option<f64>,
}

impl UserRecord {
    pub fn display_name(&self) -> String {
        non_empty(self.name.as_deref())
    }

    pub fn display_user_id(&self) -> String {
        non_empty(self.user_id.as_deref())
    }

    /// A balance of zero falls back to [`MISSING_FIELD`] like an absent one.
    pub fn display_coin(&self) -> String {
        match self.coin {
            Some(coin) if coin != 0.0 && !coin.is_nan() => coin.to_string(),
            _ => MISSING_FIELD.to_string(),
        }
    }

    /// Identifier used as the owner of gallery images.
    pub fn owner_id(&self) -> Option<&str> {
        self.user_id.as_deref().filter(|id| !id.is_empty())
    }
}

fn non_empty(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => MISSING_FIELD.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shows_all_three_fields() {
        let user: UserRecord =
            serde_json::from_str(r#"{"name":"Kim","user_id":"kim01","coin":120}"#).unwrap();
        assert_eq!(user.display_name(), "Kim");
        assert_eq!(user.display_user_id(), "kim01");
        assert_eq!(user.display_coin(), "120");
    }

    #[test]
    fn missing_fields_fall_back() {
        let user: UserRecord = serde_json::from_str(r#"{"name":""}"#).unwrap();
        assert_eq!(user.display_name(), MISSING_FIELD);
        assert_eq!(user.display_user_id(), MISSING_FIELD);
        assert_eq!(user.display_coin(), MISSING_FIELD);
        assert_eq!(user.owner_id(), None);
    }

    #[test]
    fn zero_coin_is_treated_as_missing() {
        let user = UserRecord {
            coin: Some(0.0),
            ..UserRecord::default()
        };
        assert_eq!(user.display_coin(), MISSING_FIELD);
    }

    #[test]
    fn fractional_coin_keeps_decimals() {
        let user = UserRecord {
            coin: Some(12.5),
            ..UserRecord::default()
        };
        assert_eq!(user.display_coin(), "12.5");
    }
}
