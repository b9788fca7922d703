//! # Probe and Authenticate Demo
//!
//! Walks one bridge through the full request lifecycle against the
//! simulated platform:
//! 1. Probe the capability without prompting
//! 2. Authenticate with both wait strategies
//! 3. Decline, cancel and an unavailable device
//! 4. A platform that gives up its completion handle
//!
//! ## Run
//!
//! ```bash
//! cargo run --example probe_and_authenticate
//! ```

use std::sync::Arc;
use std::time::Duration;

use biometric_core::platform::{Delivery, SimulatedPlatform, SimulatedResponse};
use biometric_core::{AuthenticationRequest, BiometricBridge, Policy};

fn main() {
    println!("=== Biometric Core: Probe and Authenticate Demo ===\n");

    // Step 1: Probe
    let platform = Arc::new(
        SimulatedPlatform::new().with_delivery(Delivery::Background(Duration::from_millis(50))),
    );
    let bridge = BiometricBridge::new(platform.clone());
    println!("Step 1: can check biometrics? {}", bridge.can_check_biometrics());
    println!("   probe calls so far: {}\n", platform.probe_calls());

    // Step 2: Both strategies
    println!("Step 2: Authenticating...");
    let blocking = bridge.authenticate_blocking("Unlock your vault", Policy::BiometricsOnly);
    println!("   blocking:   {:?}", blocking);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("runtime");
    let suspending = runtime.block_on(bridge.authenticate("Unlock your vault", Policy::BiometricsOnly));
    println!("   suspending: {:?}\n", suspending);

    // Step 3: Failures
    println!("Step 3: Failures...");
    platform.set_response(SimulatedResponse::Decline);
    println!("   decline:     {:?}", bridge.authenticate_blocking("Approve payment", Policy::BiometricsOnly));
    platform.set_response(SimulatedResponse::user_cancel());
    println!("   cancel:      {:?}", bridge.authenticate_blocking("Approve payment", Policy::BiometricsOrFallback));

    let unavailable = BiometricBridge::new(Arc::new(SimulatedPlatform::unavailable()));
    println!(
        "   unavailable: {:?}\n",
        unavailable.authenticate_blocking("Approve payment", Policy::BiometricsOnly)
    );

    // Step 4: Abandonment
    println!("Step 4: Platform tears down with a request in flight...");
    platform.set_response(SimulatedResponse::Hold);
    let request = AuthenticationRequest::new("Sign in", Policy::BiometricsOnly).expect("request");
    let id = bridge.authenticate_with_callback(
        request,
        |outcome| println!("   delivered: {:?}", outcome),
        || println!("   abandoned: release hook ran, callback never will"),
    );
    println!("   submitted handle {} (held: {})", id, platform.held_count());
    platform.teardown();

    println!("\n=== Demo Complete ===");
}
