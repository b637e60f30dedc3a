mod contacts;
mod gate;
mod legend;

pub use contacts::{Contact, ContactDialog, Dialer, LoggingDialer, EMERGENCY_CONTACTS};
pub use gate::LoadingGate;
pub use legend::{RiskTier, LEGEND_TITLE, RISK_TIERS};
