//! Two-row serial character LCD (PmodCLS in SPI mode). The module takes
//! plain text plus VT100-style escape sequences.

use embedded_hal::{digital::OutputPin, spi::SpiBus};

pub const ROW_LEN: usize = 16;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum Command {
    Clear,
    CursorOff,
    BacklightOn,
    Home,
    SecondRow,
}

impl Command {
    fn bytes(self) -> &'static [u8] {
        match self {
            Command::Clear => b"\x1b[j",
            Command::CursorOff => b"\x1b[0c",
            Command::BacklightOn => b"\x1b[3e",
            Command::Home => b"\x1b[0;0H",
            Command::SecondRow => b"\x1b[1;0H",
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error<E> {
    ChipSelect,
    InvalidRow(u8),
    Inner(E),
}

pub struct CharLcd<SPI, CS> {
    spi: SPI,
    cs: CS,
}

impl<SPI, CS, E> CharLcd<SPI, CS>
where
    SPI: SpiBus<u8, Error = E>,
    CS: OutputPin,
{
    pub fn new(spi: SPI, cs: CS) -> Self {
        Self { spi, cs }
    }

    pub fn setup(&mut self) -> Result<(), Error<E>> {
        for command in [Command::Clear, Command::CursorOff, Command::BacklightOn] {
            self.command(command)?;
        }
        Ok(())
    }

    /// Rewrites `row` (0 or 1) with `text`, padded with blanks so stale
    /// characters from a longer line do not linger.
    pub fn write_row(&mut self, row: u8, text: &str) -> Result<(), Error<E>> {
        let position = match row {
            0 => Command::Home,
            1 => Command::SecondRow,
            r => return Err(Error::InvalidRow(r)),
        };

        let mut buf = [b' '; ROW_LEN];
        let len = text.len().min(ROW_LEN);
        buf[..len].copy_from_slice(&text.as_bytes()[..len]);

        self.command(position)?;
        self.transfer(&buf)
    }

    fn command(&mut self, command: Command) -> Result<(), Error<E>> {
        self.transfer(command.bytes())
    }

    fn transfer(&mut self, bytes: &[u8]) -> Result<(), Error<E>> {
        self.cs.set_low().map_err(|_| Error::ChipSelect)?;
        let written = self
            .spi
            .write(bytes)
            .and_then(|_| self.spi.flush())
            .map_err(Error::Inner);
        self.cs.set_high().map_err(|_| Error::ChipSelect)?;
        written
    }
}
