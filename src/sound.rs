use beep::beep;
use std::error::Error;

/// Makes (or doesn't make) the interpreter's tone. The host turns it on while
/// the tone timer is running and off when it runs out.
pub trait Sound {
    fn beep(&mut self) -> Result<(), Box<dyn Error>>;
    fn stop(&mut self) -> Result<(), Box<dyn Error>>;
    fn is_beeping(&self) -> bool;
}

const SIMPLEBEEP_PITCH: u16 = 2093; // C

/// PC speaker beep through the beep crate
pub struct SimpleBeep {
    is_beeping: bool,
}

impl SimpleBeep {
    pub fn new() -> Self {
        SimpleBeep { is_beeping: false }
    }
}

impl Default for SimpleBeep {
    fn default() -> Self {
        Self::new()
    }
}

impl Sound for SimpleBeep {
    fn beep(&mut self) -> Result<(), Box<dyn Error>> {
        beep(SIMPLEBEEP_PITCH)?;
        self.is_beeping = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Box<dyn Error>> {
        beep(0)?;
        self.is_beeping = false;
        Ok(())
    }

    fn is_beeping(&self) -> bool {
        self.is_beeping
    }
}

/// silence, but keeps track of when it would have beeped
#[derive(Default)]
pub struct Mute {
    is_beeping: bool,
    pub beeps: usize,
}

impl Mute {
    pub fn new() -> Self {
        Mute::default()
    }
}

impl Sound for Mute {
    fn beep(&mut self) -> Result<(), Box<dyn Error>> {
        self.is_beeping = true;
        self.beeps += 1;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Box<dyn Error>> {
        self.is_beeping = false;
        Ok(())
    }

    fn is_beeping(&self) -> bool {
        self.is_beeping
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mute_tracks_state() -> Result<(), Box<dyn Error>> {
        let mut m = Mute::new();
        assert!(!m.is_beeping());
        m.beep()?;
        assert!(m.is_beeping());
        m.stop()?;
        assert!(!m.is_beeping());
        assert_eq!(m.beeps, 1);
        Ok(())
    }
}
