use crate::error::Fault;
use sf_core::Credits;
use sf_core::RTP_ALLOWED_DEVIATION;
use sf_core::RTP_MIN_VOLUME;
use sf_core::RTP_TARGET;

#[derive(Debug, Default)]
struct Tally {
    bets: Credits,
    wins: Credits,
}

/// Rolling return-to-player watermark. Every settled spin is admitted
/// before its win is credited; once turnover passes the minimum volume,
/// a spin that would push the running RTP outside the allowed band is
/// rejected as an integrity fault and rolled back by the controller.
pub struct RtpMonitor {
    target: f64,
    deviation: f64,
    min_volume: Credits,
    inner: parking_lot::Mutex<Tally>,
}

impl RtpMonitor {
    pub fn new() -> Self {
        Self::with_band(RTP_TARGET, RTP_ALLOWED_DEVIATION, RTP_MIN_VOLUME)
    }
    pub fn with_band(target: f64, deviation: f64, min_volume: Credits) -> Self {
        Self {
            target,
            deviation,
            min_volume,
            inner: parking_lot::Mutex::new(Tally::default()),
        }
    }

    /// Admit one settled spin into the tally, or reject it without
    /// recording when it would breach the band.
    pub fn admit(&self, bet: Credits, win: Credits) -> Result<(), Fault> {
        let mut tally = self.inner.lock();
        let bets = tally.bets + bet;
        let wins = tally.wins + win;
        if bets >= self.min_volume {
            let rtp = wins as f64 / bets as f64;
            if (rtp - self.target).abs() > self.deviation {
                log::error!(
                    "[rtp] rejecting spin: running rtp {:.4} outside {:.4} +/- {:.4}",
                    rtp,
                    self.target,
                    self.deviation,
                );
                return Err(Fault::ValidationFailed(format!(
                    "rtp {:.4} outside allowed band",
                    rtp
                )));
            }
        }
        tally.bets = bets;
        tally.wins = wins;
        Ok(())
    }

    /// Running RTP, zero before any bet.
    pub fn rtp(&self) -> f64 {
        let tally = self.inner.lock();
        if tally.bets > 0 {
            tally.wins as f64 / tally.bets as f64
        } else {
            0.0
        }
    }
}

impl Default for RtpMonitor {
    fn default() -> Self {
        Self::new()
    }
}
