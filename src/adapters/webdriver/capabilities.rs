//! W3C new-session capabilities for Chrome.

use serde_json::{json, Value};

use crate::domain::models::BrowserConfig;

/// Chrome switches derived from the browser configuration.
///
/// The user data directory carries the signed-in chat profile; without it
/// the session starts logged out.
pub fn chrome_args(config: &BrowserConfig) -> Vec<String> {
    let mut args = vec![
        "--no-first-run".to_string(),
        "--no-default-browser-check".to_string(),
        "--disable-blink-features=AutomationControlled".to_string(),
        "--start-maximized".to_string(),
    ];
    if let Some(dir) = &config.user_data_dir {
        args.push(format!("--user-data-dir={dir}"));
        args.push(format!("--profile-directory={}", config.profile_name));
    }
    if config.headless {
        args.push("--headless=new".to_string());
    }
    args.extend(config.extra_args.iter().cloned());
    args
}

/// Body of `POST /session`.
pub fn new_session_request(config: &BrowserConfig) -> Value {
    json!({
        "capabilities": {
            "alwaysMatch": {
                "browserName": "chrome",
                "pageLoadStrategy": "normal",
                "goog:chromeOptions": {
                    "args": chrome_args(config),
                    "excludeSwitches": ["enable-automation"],
                    "useAutomationExtension": false,
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_args_only_with_user_data_dir() {
        let mut config = BrowserConfig::default();
        assert!(!chrome_args(&config)
            .iter()
            .any(|a| a.starts_with("--user-data-dir")));

        config.user_data_dir = Some("/home/me/.config/chrome-bot".to_string());
        config.profile_name = "Profile 2".to_string();
        let args = chrome_args(&config);
        assert!(args.contains(&"--user-data-dir=/home/me/.config/chrome-bot".to_string()));
        assert!(args.contains(&"--profile-directory=Profile 2".to_string()));
    }

    #[test]
    fn test_headless_and_extra_args() {
        let config = BrowserConfig {
            headless: true,
            extra_args: vec!["--lang=ko-KR".to_string()],
            ..BrowserConfig::default()
        };
        let args = chrome_args(&config);
        assert!(args.contains(&"--headless=new".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("--lang=ko-KR"));
    }

    #[test]
    fn test_new_session_request_shape() {
        let body = new_session_request(&BrowserConfig::default());
        let always = &body["capabilities"]["alwaysMatch"];
        assert_eq!(always["browserName"], "chrome");
        assert!(always["goog:chromeOptions"]["args"].is_array());
    }
}
