//! Biometric CLI
//!
//! Drives the biometric bridge end to end against a simulated platform:
//!
//! 1. **probe**: the non-prompting capability check.
//!
//! 2. **authenticate**: one full request through either wait strategy,
//!    printing the transport result as JSON.
//!
//! The simulator stands in for the OS prompt, so every outcome (success,
//! decline, cancel, lockout, a platform that never answers) can be
//! reproduced from a terminal.

use std::sync::Arc;
use std::time::Duration;

use biometric_core::platform::{Delivery, SimulatedPlatform, SimulatedResponse};
use biometric_core::{AuthResult, BiometricBridge, BridgeConfig, Policy, Strategy};
use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::Result;

// ── CLI Arguments ─────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "biometric", version, about = "Biometric bridge driver")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check whether biometric evaluation is possible (never prompts)
    Probe {
        /// Simulate a device without enrolled biometrics
        #[arg(long)]
        unavailable: bool,
    },

    /// Run one authentication request
    Authenticate(AuthenticateArgs),
}

#[derive(clap::Args, Debug)]
struct AuthenticateArgs {
    /// Reason shown in the prompt
    #[arg(short, long)]
    reason: String,

    /// Policy to evaluate (defaults to BIOMETRIC_BRIDGE_POLICY or biometrics-only)
    #[arg(short, long, value_enum)]
    policy: Option<PolicyArg>,

    /// How the caller waits for the answer
    #[arg(short, long, value_enum, default_value_t = StrategyArg::Blocking)]
    strategy: StrategyArg,

    /// Scripted platform answer
    #[arg(long, value_enum, default_value_t = Simulate::Success)]
    simulate: Simulate,

    /// Deliver the answer from a background thread after this delay
    #[arg(long, default_value_t = 0)]
    delay_ms: u64,

    /// Stop waiting after this long
    #[arg(long, env = "BIOMETRIC_BRIDGE_WAIT_TIMEOUT_MS")]
    timeout_ms: Option<u64>,

    /// Simulate a device without enrolled biometrics
    #[arg(long)]
    unavailable: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PolicyArg {
    BiometricsOnly,
    BiometricsOrFallback,
}

impl From<PolicyArg> for Policy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::BiometricsOnly => Policy::BiometricsOnly,
            PolicyArg::BiometricsOrFallback => Policy::BiometricsOrFallback,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum StrategyArg {
    Blocking,
    Suspending,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Blocking => Strategy::Blocking,
            StrategyArg::Suspending => Strategy::Suspending,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum Simulate {
    Success,
    Decline,
    Cancel,
    Lockout,
    Hang,
}

impl From<Simulate> for SimulatedResponse {
    fn from(arg: Simulate) -> Self {
        match arg {
            Simulate::Success => SimulatedResponse::Authenticate,
            Simulate::Decline => SimulatedResponse::Decline,
            Simulate::Cancel => SimulatedResponse::user_cancel(),
            Simulate::Lockout => SimulatedResponse::lockout(),
            Simulate::Hang => SimulatedResponse::Hold,
        }
    }
}

// ── Entry Point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "biometric_core=info,biometric_cli=info".into()),
        )
        .init();

    let args = Args::parse();

    match args.command {
        Command::Probe { unavailable } => {
            let platform = simulated(unavailable);
            let bridge = BiometricBridge::new(Arc::new(platform));
            println!("{}", serde_json::to_string(&bridge.can_check_biometrics())?);
        }
        Command::Authenticate(options) => {
            let result = authenticate(options)?;
            println!("{}", serde_json::to_string(&result)?);
            if !result.is_ok() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// Run one request against the simulator with the chosen strategy
fn authenticate(options: AuthenticateArgs) -> Result<AuthResult> {
    let config = BridgeConfig::from_env().with_wait_timeout(options.timeout_ms.map(Duration::from_millis));
    if options.simulate == Simulate::Hang && config.wait_timeout().is_none() {
        tracing::warn!("Simulated platform never answers and no timeout is set; this will wait forever");
    }

    let delivery = if options.delay_ms == 0 {
        Delivery::Inline
    } else {
        Delivery::Background(Duration::from_millis(options.delay_ms))
    };
    let platform = simulated(options.unavailable)
        .with_response(options.simulate.into())
        .with_delivery(delivery);

    let policy = options.policy.map(Policy::from).unwrap_or(config.default_policy);
    let bridge = BiometricBridge::with_config(Arc::new(platform), config);

    tracing::info!(%policy, strategy = ?options.strategy, "Authenticating");
    let result = match Strategy::from(options.strategy) {
        Strategy::Blocking => bridge.authenticate_blocking(&options.reason, policy),
        Strategy::Suspending => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()?;
            runtime.block_on(bridge.authenticate(&options.reason, policy))
        }
    };
    Ok(result)
}

fn simulated(unavailable: bool) -> SimulatedPlatform {
    if unavailable {
        SimulatedPlatform::unavailable()
    } else {
        SimulatedPlatform::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biometric_core::{PlatformError, PlatformErrorCode, TransportResult};

    fn authenticate_args(args: &[&str]) -> AuthenticateArgs {
        let mut argv = vec!["biometric", "authenticate"];
        argv.extend_from_slice(args);
        match Args::try_parse_from(argv).unwrap().command {
            Command::Authenticate(options) => options,
            other => panic!("parsed {:?}", other),
        }
    }

    #[test]
    fn test_parse_authenticate() {
        let options = authenticate_args(&[
            "--reason",
            "Approve payment",
            "--policy",
            "biometrics-or-fallback",
            "--strategy",
            "suspending",
            "--simulate",
            "cancel",
            "--delay-ms",
            "20",
            "--timeout-ms",
            "500",
        ]);

        assert_eq!(options.reason, "Approve payment");
        assert_eq!(options.policy.map(Policy::from), Some(Policy::BiometricsOrFallback));
        assert_eq!(Strategy::from(options.strategy), Strategy::Suspending);
        assert_eq!(options.simulate, Simulate::Cancel);
        assert_eq!(options.delay_ms, 20);
        assert_eq!(options.timeout_ms, Some(500));
        assert!(!options.unavailable);
    }

    #[test]
    fn test_parse_defaults_and_rejects() {
        let options = authenticate_args(&["--reason", ""]);
        assert_eq!(options.reason, "");
        assert!(options.policy.is_none());
        assert_eq!(Strategy::from(options.strategy), Strategy::Blocking);
        assert_eq!(options.simulate, Simulate::Success);
        assert_eq!(options.delay_ms, 0);

        assert!(Args::try_parse_from(["biometric", "authenticate"]).is_err());
        assert!(Args::try_parse_from(["biometric", "authenticate", "--reason", "x", "--simulate", "shrug"]).is_err());

        let probe = Args::try_parse_from(["biometric", "probe", "--unavailable"]).unwrap();
        assert!(matches!(probe.command, Command::Probe { unavailable: true }));
    }

    #[test]
    fn test_simulate_maps_to_platform_response() {
        assert_eq!(SimulatedResponse::from(Simulate::Success), SimulatedResponse::Authenticate);
        assert_eq!(SimulatedResponse::from(Simulate::Decline), SimulatedResponse::Decline);
        assert_eq!(SimulatedResponse::from(Simulate::Hang), SimulatedResponse::Hold);
        assert_eq!(
            SimulatedResponse::from(Simulate::Cancel),
            SimulatedResponse::Fail(PlatformError::new(PlatformErrorCode::UserCancel, "Authentication canceled."))
        );
        assert!(matches!(
            SimulatedResponse::from(Simulate::Lockout),
            SimulatedResponse::Fail(PlatformError { code: PlatformErrorCode::BiometryLockout, .. })
        ));
    }

    #[test]
    fn test_authenticate_end_to_end() {
        let ok = authenticate(authenticate_args(&["--reason", "unlock vault", "--timeout-ms", "2000"])).unwrap();
        assert_eq!(ok, TransportResult::Ok("true".to_string()));

        let declined = authenticate(authenticate_args(&[
            "--reason",
            "unlock vault",
            "--simulate",
            "decline",
            "--strategy",
            "suspending",
            "--delay-ms",
            "10",
            "--timeout-ms",
            "2000",
        ]))
        .unwrap();
        assert_eq!(declined, TransportResult::Err("Authentication failed".to_string()));

        let unavailable = authenticate(authenticate_args(&["--reason", "x", "--unavailable", "--timeout-ms", "2000"])).unwrap();
        assert_eq!(unavailable, TransportResult::Err("not available".to_string()));

        let hung = authenticate(authenticate_args(&["--reason", "x", "--simulate", "hang", "--timeout-ms", "10"])).unwrap();
        assert_eq!(hung, TransportResult::Err("Authentication timed out".to_string()));
    }
}
