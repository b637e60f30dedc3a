use anyhow::{bail, Result};
use tracing::info;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Contact {
    pub label: &'static str,
    pub number: &'static str,
}

impl Contact {
    pub fn tel_uri(&self) -> String {
        format!("tel:{}", self.number)
    }
}

pub const EMERGENCY_CONTACTS: [Contact; 3] = [
    Contact {
        label: "Police",
        number: "100",
    },
    Contact {
        label: "Ambulance",
        number: "102",
    },
    Contact {
        label: "Emergency Helpline",
        number: "112",
    },
];

/// Platform hook that places a call for a `tel:` URI
pub trait Dialer {
    fn dial(&mut self, uri: &str) -> Result<()>;
}

/// Records dial requests in the log; the terminal has no telephony.
#[derive(Debug, Default)]
pub struct LoggingDialer {
    pub last: Option<String>,
}

impl Dialer for LoggingDialer {
    fn dial(&mut self, uri: &str) -> Result<()> {
        info!(uri, "dial requested");
        self.last = Some(uri.to_string());
        Ok(())
    }
}

/// Emergency contact list shown as a modal; shares no state with the map.
#[derive(Debug, Default)]
pub struct ContactDialog {
    open: bool,
}

impl ContactDialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn contacts(&self) -> &'static [Contact] {
        &EMERGENCY_CONTACTS
    }

    /// Dial the entry at `index` (0-based)
    pub fn dial(&self, index: usize, dialer: &mut dyn Dialer) -> Result<Contact> {
        let Some(contact) = EMERGENCY_CONTACTS.get(index).copied() else {
            bail!("no emergency contact at position {}", index + 1);
        };
        dialer.dial(&contact.tel_uri())?;
        Ok(contact)
    }
}
