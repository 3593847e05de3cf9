/// Lockbox configuration from environment variables
///
/// Controls the ledger RPC endpoint, the tracked contract address, and the
/// connection project identifier. Validation runs eagerly at startup and is
/// strict in CI/production contexts.
use std::env;
use std::time::Duration;

/// Environment variables:
/// - `LOCKBOX_RPC_URL`: ledger RPC endpoint (default `http://localhost:8545`)
/// - `LOCKBOX_PROJECT_ID`: connection project identifier (required)
/// - `LOCKBOX_CONTRACT_ADDRESS`: tracked contract, `0x` + 40 hex chars
/// - `LOCKBOX_CHAIN_ID`: numeric chain id (default 84532, Base Sepolia)
/// - `LOCKBOX_CONFIRMATION_TIMEOUT_SECS`: bounded confirmation wait (default 300)
/// - `LOCKBOX_ENV`: set to `production` to force strict validation
#[derive(Clone, Debug)]
pub struct LockboxConfig {
    /// Ledger RPC endpoint
    pub rpc_url: String,
    /// Connection project identifier
    pub project_id: String,
    /// Tracked contract address; `None` until deployment is configured
    pub contract_address: Option<String>,
    /// Chain id the contract is deployed on
    pub chain_id: u64,
    /// Upper bound on the confirmation wait
    pub confirmation_timeout: Duration,
}

impl LockboxConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let rpc_url = env::var("LOCKBOX_RPC_URL").unwrap_or_else(|_| {
            log::info!("Ledger RPC URL: http://localhost:8545 (default)");
            "http://localhost:8545".to_string()
        });

        let project_id = env::var("LOCKBOX_PROJECT_ID").unwrap_or_default();

        let contract_address = env::var("LOCKBOX_CONTRACT_ADDRESS")
            .ok()
            .filter(|addr| !addr.is_empty());
        match &contract_address {
            Some(addr) => log::info!("Tracked contract: {}", addr),
            None => log::warn!("LOCKBOX_CONTRACT_ADDRESS is not set; submissions are disabled"),
        }

        let chain_id = env::var("LOCKBOX_CHAIN_ID")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(84532);

        let timeout_secs = env::var("LOCKBOX_CONFIRMATION_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(300);

        Self {
            rpc_url,
            project_id,
            contract_address,
            chain_id,
            confirmation_timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// Validate this configuration, detecting strictness from the environment
    pub fn validate(&self) -> ValidationReport {
        validate(
            &self.project_id,
            self.contract_address.as_deref().unwrap_or(""),
            strict_mode(),
        )
    }
}

impl Default for LockboxConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            project_id: String::new(),
            contract_address: None,
            chain_id: 84532,
            confirmation_timeout: Duration::from_secs(300),
        }
    }
}

/// Outcome of eager configuration validation.
///
/// Errors block core functionality; warnings mean degraded but usable.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub is_strict: bool,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Log the report the way the app surfaces it at startup
    pub fn log(&self) {
        for error in &self.errors {
            log::error!("{}", error);
        }
        for warning in &self.warnings {
            log::warn!("{}", warning);
        }
        if self.errors.is_empty() && self.warnings.is_empty() {
            log::info!("Environment validation passed");
        }
    }
}

/// Strict validation is on in CI and production build contexts
pub fn strict_mode() -> bool {
    const CI_VARS: [&str; 6] = [
        "CI",
        "GITHUB_ACTIONS",
        "GITLAB_CI",
        "CIRCLECI",
        "TRAVIS",
        "JENKINS_URL",
    ];
    if CI_VARS.iter().any(|var| {
        env::var(var)
            .map(|value| !value.is_empty())
            .unwrap_or(false)
    }) {
        return true;
    }
    env::var("LOCKBOX_ENV")
        .map(|mode| mode == "production")
        .unwrap_or(false)
}

/// Classify the configured project id and contract address.
///
/// Pure: strictness is an input, so the rules are testable without touching
/// the process environment.
pub fn validate(project_id: &str, contract_address: &str, strict: bool) -> ValidationReport {
    let mut report = ValidationReport {
        is_strict: strict,
        ..Default::default()
    };

    if project_id.trim().is_empty() {
        report.errors.push(
            "LOCKBOX_PROJECT_ID is not set. This is required for ledger connection functionality."
                .to_string(),
        );
    } else if project_id.trim().len() < 32 {
        report
            .warnings
            .push("LOCKBOX_PROJECT_ID seems too short. Verify it is correct.".to_string());
    }

    if contract_address.is_empty() {
        if strict {
            report
                .errors
                .push("LOCKBOX_CONTRACT_ADDRESS is not set".to_string());
        } else {
            report.warnings.push(
                "LOCKBOX_CONTRACT_ADDRESS is not set. Submissions are disabled. \
                 This will be an error in CI/production builds."
                    .to_string(),
            );
        }
    } else if let Err(reason) = validate_address(contract_address) {
        report.errors.push(reason);
    }

    report
}

/// Structural check for a ledger address: `0x` + 40 hex characters.
///
/// Applied to any externally supplied address, in both strictness modes.
pub fn validate_address(address: &str) -> Result<(), String> {
    if !address.starts_with("0x") {
        return Err("LOCKBOX_CONTRACT_ADDRESS must start with \"0x\"".to_string());
    }
    if address.len() != 42 {
        return Err("LOCKBOX_CONTRACT_ADDRESS must be 42 characters (including \"0x\")".to_string());
    }
    if hex::decode(&address[2..]).is_err() {
        return Err("LOCKBOX_CONTRACT_ADDRESS contains non-hexadecimal characters".to_string());
    }
    Ok(())
}
