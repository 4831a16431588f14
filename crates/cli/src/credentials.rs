//! Store target resolution: flag > env > error.
//!
//! Secrets are taken from flags or environment variables only, never from
//! the config file.

use crate::exit_codes;
use crate::CliError;

pub const PRODUCTION_BASE_URL: &str = "https://firestore.googleapis.com";

const TOKEN_ENV_VARS: &[&str] = &["FIRESTORE_ACCESS_TOKEN", "GOOGLE_OAUTH_ACCESS_TOKEN"];
const PROJECT_ENV_VARS: &[&str] = &["FIREBASE_PROJECT_ID", "GOOGLE_CLOUD_PROJECT"];
const EMULATOR_ENV_VAR: &str = "FIRESTORE_EMULATOR_HOST";

/// The emulator accepts any request carrying this token.
const EMULATOR_TOKEN: &str = "owner";

/// Where and as whom the Firestore client connects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreTarget {
    pub base_url: String,
    pub project: String,
    pub database: String,
    pub token: String,
    pub emulator: bool,
}

#[derive(Debug, Default)]
pub struct TargetFlags {
    pub project: Option<String>,
    pub database: Option<String>,
    pub access_token: Option<String>,
}

pub fn resolve_target(flags: TargetFlags) -> Result<StoreTarget, CliError> {
    resolve_target_with(flags, |name| std::env::var(name).ok())
}

/// Same as [`resolve_target`] with an injectable env lookup.
pub fn resolve_target_with(
    flags: TargetFlags,
    env: impl Fn(&str) -> Option<String>,
) -> Result<StoreTarget, CliError> {
    let emulator_host = non_empty(env(EMULATOR_ENV_VAR));

    let project = non_empty(flags.project)
        .or_else(|| PROJECT_ENV_VARS.iter().find_map(|v| non_empty(env(*v))))
        .ok_or_else(|| CliError {
            code: exit_codes::EXIT_STORE_NOT_AUTH,
            message: format!(
                "missing Firebase project id (use --project or set {})",
                PROJECT_ENV_VARS.join(" / "),
            ),
            hint: None,
        })?;

    let database = non_empty(flags.database).unwrap_or_else(|| "(default)".to_string());

    if let Some(host) = emulator_host {
        let base_url = if host.starts_with("http://") || host.starts_with("https://") {
            host.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", host.trim_end_matches('/'))
        };
        return Ok(StoreTarget {
            base_url,
            project,
            database,
            token: non_empty(flags.access_token).unwrap_or_else(|| EMULATOR_TOKEN.to_string()),
            emulator: true,
        });
    }

    let token = non_empty(flags.access_token)
        .or_else(|| TOKEN_ENV_VARS.iter().find_map(|v| non_empty(env(*v))))
        .ok_or_else(|| CliError {
            code: exit_codes::EXIT_STORE_NOT_AUTH,
            message: format!(
                "missing Firestore access token (use --access-token or set {})",
                TOKEN_ENV_VARS.join(" / "),
            ),
            hint: Some("gcloud auth print-access-token, or set FIRESTORE_EMULATOR_HOST for a local emulator".into()),
        })?;

    Ok(StoreTarget {
        base_url: PRODUCTION_BASE_URL.to_string(),
        project,
        database,
        token,
        emulator: false,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
