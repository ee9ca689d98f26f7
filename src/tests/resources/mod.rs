mod discovery_tests;
mod scaler_tests;
