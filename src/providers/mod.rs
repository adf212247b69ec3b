pub mod alpha_vantage;
pub mod fallback;
pub mod throttle;
