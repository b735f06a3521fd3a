/// Endpoints and static assets the page depends on.
///
/// WebAssembly has no process environment, so overrides are read at
/// compile time from `MYPAGE_API_BASE`, `MYPAGE_IMAGE_API_BASE` and
/// `MYPAGE_DEFAULT_PROFILE_IMAGE`.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Host serving the current-user and change-password calls.
    pub api_base_url: String,
    /// Host serving `/get-images`, `/upload-image` and `/delete-image`.
    pub image_api_base_url: String,
    /// Shown until the user picks a file.
    pub default_profile_image: String,
}

const DEFAULT_API_BASE: &str = "http://localhost:3011";
const DEFAULT_PROFILE_IMAGE: &str = "/img/mypage.png";

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE.to_string(),
            image_api_base_url: DEFAULT_API_BASE.to_string(),
            default_profile_image: DEFAULT_PROFILE_IMAGE.to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_build_env() -> Self {
        Self::with_overrides(
            option_env!("MYPAGE_API_BASE"),
            option_env!("MYPAGE_IMAGE_API_BASE"),
            option_env!("MYPAGE_DEFAULT_PROFILE_IMAGE"),
        )
    }

    fn with_overrides(api: Option<&str>, images: Option<&str>, picture: Option<&str>) -> Self {
        let mut config = Self::default();
        if let Some(api) = api.filter(|v| !v.is_empty()) {
            config.api_base_url = api.to_string();
            // the image host follows the main host unless set on its own
            config.image_api_base_url = api.to_string();
        }
        if let Some(images) = images.filter(|v| !v.is_empty()) {
            config.image_api_base_url = images.to_string();
        }
        if let Some(picture) = picture.filter(|v| !v.is_empty()) {
            config.default_profile_image = picture.to_string();
        }
        config
    }

    pub fn api_url(&self, path: &str) -> String {
        join_url(&self.api_base_url, path)
    }

    pub fn image_api_url(&self, path: &str) -> String {
        join_url(&self.image_api_base_url, path)
    }
}

/// Joins a base URL and a path with exactly one `/` between them.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
