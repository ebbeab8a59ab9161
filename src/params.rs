//! Line parameters for a single scanner connection.
//!
//! `ConnectionParameters` is an immutable, fully populated record: it can
//! only be built through [`ConnectionParameters::new`], which rejects empty
//! port names and a zero baud rate. The enums accept the names used in the
//! configuration file and convert fallibly into the `serialport` types,
//! because a few settings that are valid on the wire (mark/space parity,
//! 1.5 stop bits, 4 data bits) have no representation in that binding.

use crate::config::{ConfigError, ConfigResult};
use crate::port::PortError;
use std::fmt;
use std::str::FromStr;

/// Lowercase a setting name and strip separators so `One_Point_Five`,
/// `one-point-five` and `OnePointFive` compare equal.
fn normalize(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Parity checking modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parity {
    None,
    Odd,
    Even,
    Mark,
    Space,
}

impl Parity {
    fn letter(self) -> char {
        match self {
            Parity::None => 'N',
            Parity::Odd => 'O',
            Parity::Even => 'E',
            Parity::Mark => 'M',
            Parity::Space => 'S',
        }
    }
}

impl FromStr for Parity {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "none" | "n" => Ok(Parity::None),
            "odd" | "o" => Ok(Parity::Odd),
            "even" | "e" => Ok(Parity::Even),
            "mark" | "m" => Ok(Parity::Mark),
            "space" | "s" => Ok(Parity::Space),
            _ => Err(ConfigError::validation(
                "parity",
                format!("unknown parity '{s}'"),
            )),
        }
    }
}

impl TryFrom<Parity> for serialport::Parity {
    type Error = PortError;

    fn try_from(parity: Parity) -> Result<Self, Self::Error> {
        match parity {
            Parity::None => Ok(serialport::Parity::None),
            Parity::Odd => Ok(serialport::Parity::Odd),
            Parity::Even => Ok(serialport::Parity::Even),
            Parity::Mark | Parity::Space => Err(PortError::unsupported(format!(
                "{parity:?} parity"
            ))),
        }
    }
}

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataBits {
    Four,
    Five,
    Six,
    Seven,
    Eight,
}

impl DataBits {
    /// The bit count as a number.
    pub fn bits(self) -> u8 {
        match self {
            DataBits::Four => 4,
            DataBits::Five => 5,
            DataBits::Six => 6,
            DataBits::Seven => 7,
            DataBits::Eight => 8,
        }
    }
}

impl TryFrom<u8> for DataBits {
    type Error = ConfigError;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        match bits {
            4 => Ok(DataBits::Four),
            5 => Ok(DataBits::Five),
            6 => Ok(DataBits::Six),
            7 => Ok(DataBits::Seven),
            8 => Ok(DataBits::Eight),
            other => Err(ConfigError::validation(
                "data_bits",
                format!("{other} is outside the supported range 4-8"),
            )),
        }
    }
}

impl FromStr for DataBits {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bits: u8 = s.trim().parse().map_err(|_| {
            ConfigError::validation("data_bits", format!("'{s}' is not a number"))
        })?;
        DataBits::try_from(bits)
    }
}

impl TryFrom<DataBits> for serialport::DataBits {
    type Error = PortError;

    fn try_from(bits: DataBits) -> Result<Self, Self::Error> {
        match bits {
            DataBits::Four => Err(PortError::unsupported("4 data bits")),
            DataBits::Five => Ok(serialport::DataBits::Five),
            DataBits::Six => Ok(serialport::DataBits::Six),
            DataBits::Seven => Ok(serialport::DataBits::Seven),
            DataBits::Eight => Ok(serialport::DataBits::Eight),
        }
    }
}

/// Number of stop bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopBits {
    One,
    OnePointFive,
    Two,
}

impl FromStr for StopBits {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "one" | "1" => Ok(StopBits::One),
            "onepointfive" | "1.5" => Ok(StopBits::OnePointFive),
            "two" | "2" => Ok(StopBits::Two),
            _ => Err(ConfigError::validation(
                "stop_bits",
                format!("unknown stop bits '{s}'"),
            )),
        }
    }
}

impl TryFrom<StopBits> for serialport::StopBits {
    type Error = PortError;

    fn try_from(bits: StopBits) -> Result<Self, Self::Error> {
        match bits {
            StopBits::One => Ok(serialport::StopBits::One),
            StopBits::OnePointFive => Err(PortError::unsupported("1.5 stop bits")),
            StopBits::Two => Ok(serialport::StopBits::Two),
        }
    }
}

impl fmt::Display for StopBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopBits::One => f.write_str("1"),
            StopBits::OnePointFive => f.write_str("1.5"),
            StopBits::Two => f.write_str("2"),
        }
    }
}

/// Everything needed to open one scanner port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParameters {
    port_name: String,
    baud_rate: u32,
    parity: Parity,
    data_bits: DataBits,
    stop_bits: StopBits,
}

impl ConnectionParameters {
    /// Build a parameter record.
    ///
    /// # Errors
    ///
    /// - `ConfigError::MissingRequired` if `port_name` is blank
    /// - `ConfigError::ValidationError` if `baud_rate` is zero
    pub fn new(
        port_name: impl Into<String>,
        baud_rate: u32,
        parity: Parity,
        data_bits: DataBits,
        stop_bits: StopBits,
    ) -> ConfigResult<Self> {
        let port_name = port_name.into();
        if port_name.trim().is_empty() {
            return Err(ConfigError::MissingRequired("port name".to_string()));
        }
        if baud_rate == 0 {
            return Err(ConfigError::validation(
                "baud_rate",
                "must be a positive integer",
            ));
        }

        Ok(Self {
            port_name,
            baud_rate,
            parity,
            data_bits,
            stop_bits,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    pub fn parity(&self) -> Parity {
        self.parity
    }

    pub fn data_bits(&self) -> DataBits {
        self.data_bits
    }

    pub fn stop_bits(&self) -> StopBits {
        self.stop_bits
    }
}

/// Renders as `COM3 9600 8N1`.
impl fmt::Display for ConnectionParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}{}{}",
            self.port_name,
            self.baud_rate,
            self.data_bits.bits(),
            self.parity.letter(),
            self.stop_bits
        )
    }
}
