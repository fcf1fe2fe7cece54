use serde::Serialize;

use blobcup_types::VoterId;

/// Coarse traits of the environment a voter runs in.
///
/// None of these are secret and none are unique on their own; together they
/// are "probably the same device".
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentTraits {
    pub user_agent: String,
    pub language: String,
    pub platform: String,
    pub screen_resolution: String,
    pub color_depth: String,
    pub timezone: String,
    pub host: String,
    pub hardware_concurrency: usize,
}

impl EnvironmentTraits {
    /// Sample the current process environment.
    pub fn detect() -> Self {
        let var = |name: &str| std::env::var(name).unwrap_or_default();
        Self {
            user_agent: format!(
                "blobcup/{} ({}; {})",
                env!("CARGO_PKG_VERSION"),
                std::env::consts::OS,
                std::env::consts::ARCH
            ),
            language: first_non_empty(&[var("LC_ALL"), var("LANG")]),
            platform: std::env::consts::FAMILY.to_string(),
            screen_resolution: format!("{}x{}", var("COLUMNS"), var("LINES")),
            color_depth: var("COLORTERM"),
            timezone: first_non_empty(&[
                var("TZ"),
                chrono::Local::now().offset().to_string(),
            ]),
            host: first_non_empty(&[var("HOSTNAME"), var("COMPUTERNAME")]),
            hardware_concurrency: std::thread::available_parallelism()
                .map(usize::from)
                .unwrap_or(0),
        }
    }
}

fn first_non_empty(values: &[String]) -> String {
    values
        .iter()
        .find(|v| !v.is_empty())
        .cloned()
        .unwrap_or_default()
}

/// Derives voter ids from environment traits.
pub struct Fingerprint;

impl Fingerprint {
    const PREFIX: &'static str = "fp_";

    /// Hash the canonical JSON of `traits` into an `fp_<base36>` id.
    pub fn derive(traits: &EnvironmentTraits) -> VoterId {
        // Field order is fixed by the struct, so the JSON is canonical.
        let canonical = serde_json::to_vec(traits).unwrap_or_default();
        let digest = blake3::hash(&canonical);
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest.as_bytes()[..8]);
        let id = format!("{}{}", Self::PREFIX, to_base36(u64::from_le_bytes(head)));
        VoterId::new(id).unwrap_or_else(|_| unreachable!("prefixed ids are never empty"))
    }

    pub fn detect() -> VoterId {
        Self::derive(&EnvironmentTraits::detect())
    }
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}
