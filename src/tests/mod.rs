// Test modules for igd-primitives
// Shared fakes live in `support`

mod gateway_tests;
mod settings_tests;
mod support;
