use std::io::Write;
use std::time::Duration;

use serialport::SerialPort;
use tracing::info;

use crate::config::{StripConfig, MAX_LEDS};
use crate::error::{GlowError, Result};
use crate::mapper::LedBuffer;

/// The LED strip as seen by the driver: stage a full buffer, then push it out.
pub trait LedStrip {
    fn write_buffer(&mut self, leds: &LedBuffer) -> Result<()>;

    /// Transmits the staged buffer. Returns once the whole frame is sent.
    fn show(&mut self) -> Result<()>;
}

impl<L: LedStrip + ?Sized> LedStrip for Box<L> {
    fn write_buffer(&mut self, leds: &LedBuffer) -> Result<()> {
        (**self).write_buffer(leds)
    }

    fn show(&mut self) -> Result<()> {
        (**self).show()
    }
}

/// `'A' 'd' 'a'`, LED count minus one as big endian u16, then a checksum of the two.
pub fn get_header(leds: usize) -> [u8; 6] {
    let num_leds = leds.saturating_sub(1) as u16;
    let hi = ((num_leds & 0xFF00) >> 8) as u8;
    let lo = (num_leds & 0xFF) as u8;
    let checksum = hi ^ lo ^ 0x55;
    [b'A', b'd', b'a', hi, lo, checksum]
}

/// Adalight framing over a byte sink, usually a serial port.
pub struct Adalight<W: Write = Box<dyn SerialPort>> {
    port: W,
    leds: usize,
    packet: Vec<u8>,
}

impl Adalight {
    pub fn open(config: &StripConfig, leds: usize) -> Result<Self> {
        let init = |e: serialport::Error| GlowError::init(&config.port, e);
        let mut port = serialport::new(&config.port, config.baud_rate)
            .timeout(Duration::from_millis(config.timeout_ms))
            .open()
            .map_err(init)?;
        port.write_data_terminal_ready(true).map_err(init)?;
        if config.hardware_flow_control {
            port.set_flow_control(serialport::FlowControl::Hardware)
                .map_err(init)?;
        }
        info!(
            "Opened {} at {} baud for {} LEDs",
            config.port, config.baud_rate, leds
        );
        Self::with_writer(port, leds)
    }
}

impl<W: Write> Adalight<W> {
    pub fn with_writer(port: W, leds: usize) -> Result<Self> {
        if leds == 0 || leds > MAX_LEDS {
            return Err(GlowError::init(
                "adalight",
                format!("cannot drive {leds} LEDs"),
            ));
        }
        let mut packet = Vec::with_capacity(6 + leds * 3);
        packet.extend_from_slice(&get_header(leds));
        packet.resize(6 + leds * 3, 0);
        Ok(Self { port, leds, packet })
    }

    pub fn packet(&self) -> &[u8] {
        &self.packet
    }

    pub fn into_inner(self) -> W {
        self.port
    }
}

impl<W: Write> LedStrip for Adalight<W> {
    fn write_buffer(&mut self, leds: &LedBuffer) -> Result<()> {
        if leds.len() != self.leds {
            return Err(GlowError::Transport(format!(
                "strip has {} LEDs, buffer has {}",
                self.leds,
                leds.len()
            )));
        }
        for (slot, color) in self.packet[6..].chunks_exact_mut(3).zip(leds.colors()) {
            slot.copy_from_slice(&[color.red, color.green, color.blue]);
        }
        Ok(())
    }

    fn show(&mut self) -> Result<()> {
        self.port
            .write_all(&self.packet)
            .and_then(|()| self.port.flush())
            .map_err(|e| GlowError::Transport(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Edge, EdgeLayout};
    use crate::frame::{Bgr, Size};
    use crate::gamma::GammaLookup;
    use crate::mapper::PixelMapper;
    use crate::sampler::{SampledEdge, SampledEdges};

    #[test]
    fn test_header() {
        assert_eq!(get_header(120), [b'A', b'd', b'a', 0, 119, 119 ^ 0x55]);
        assert_eq!(get_header(192), [b'A', b'd', b'a', 0, 191, 191 ^ 0x55]);
        assert_eq!(get_header(300), [b'A', b'd', b'a', 1, 43, 1 ^ 43 ^ 0x55]);
        assert_eq!(get_header(MAX_LEDS), [b'A', b'd', b'a', 0xFF, 0xFF, 0x55]);
    }

    fn buffer(colors: [Bgr; 4]) -> LedBuffer {
        let layout = EdgeLayout::with_margin(Size::new(10, 10), 2, [1, 1, 1, 1]);
        let edge = |edge: Edge, c: Bgr| SampledEdge {
            edge,
            samples: vec![c],
        };
        PixelMapper::new(layout, GammaLookup::identity()).map(&SampledEdges {
            top: edge(Edge::Top, colors[0]),
            right: edge(Edge::Right, colors[1]),
            bottom: edge(Edge::Bottom, colors[2]),
            left: edge(Edge::Left, colors[3]),
        })
        .unwrap()
    }

    #[test]
    fn test_show_sends_header_and_rgb_payload() {
        let mut strip = Adalight::with_writer(Vec::new(), 4).unwrap();
        strip
            .write_buffer(&buffer([
                Bgr::new(0, 0, 255),
                Bgr::new(0, 255, 0),
                Bgr::new(255, 0, 0),
                Bgr::new(1, 2, 3),
            ]))
            .unwrap();
        assert_eq!(strip.packet().len(), 6 + 4 * 3);
        strip.show().unwrap();
        let sent = strip.into_inner();
        assert_eq!(
            sent,
            vec![
                b'A', b'd', b'a', 0, 3, 3 ^ 0x55,
                255, 0, 0,
                0, 255, 0,
                0, 0, 255,
                3, 2, 1,
            ]
        );
    }

    #[test]
    fn test_staging_does_not_transmit() {
        let mut strip = Adalight::with_writer(Vec::new(), 4).unwrap();
        strip.write_buffer(&buffer([Bgr::default(); 4])).unwrap();
        assert!(strip.into_inner().is_empty());
    }

    #[test]
    fn test_rejects_mismatched_buffer() {
        let mut strip = Adalight::with_writer(Vec::new(), 5).unwrap();
        assert!(matches!(
            strip.write_buffer(&buffer([Bgr::default(); 4])),
            Err(GlowError::Transport(_))
        ));
        assert!(Adalight::with_writer(Vec::new(), 0).is_err());
    }
}
