//! Textual scene descriptions of the form `name:fps[:life_sec]`.

use core::fmt;
use core::str::FromStr;

use scene::{FrameRate, SceneError, SceneHandle, SceneHooks, SceneRegistry};

/// Parsed `name:fps[:life_sec]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneDescriptor {
    pub name: String,
    pub fps: f64,
    pub life_sec: Option<f64>,
}

impl SceneDescriptor {
    /// Adds a scene built from this description to `registry`.
    pub fn add_to<H: SceneHooks>(&self, registry: &mut SceneRegistry, hooks: H) -> SceneHandle<H> {
        match self.life_sec {
            Some(life) => registry.add_with_life(self.name.clone(), self.fps, life, hooks),
            None => registry.add(self.name.clone(), self.fps, hooks),
        }
    }
}

impl FromStr for SceneDescriptor {
    type Err = SceneError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let invalid = || SceneError::InvalidDescriptor(text.to_owned());
        let mut parts = text.split(':');

        let name = parts.next().map(str::trim).filter(|n| !n.is_empty()).ok_or_else(invalid)?;
        let fps_text = parts.next().ok_or_else(invalid)?;
        let fps: f64 = fps_text.trim().parse().map_err(|_| invalid())?;
        let fps = FrameRate::new(fps)?.fps();

        let life_sec = match parts.next() {
            None => None,
            Some(life_text) => {
                let life: f64 = life_text.trim().parse().map_err(|_| invalid())?;
                if !life.is_finite() || life <= 0.0 {
                    return Err(SceneError::InvalidDuration(life));
                }
                Some(life)
            }
        };

        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(Self {
            name: name.to_owned(),
            fps,
            life_sec,
        })
    }
}

impl fmt::Display for SceneDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.fps)?;
        if let Some(life) = self.life_sec {
            write!(f, ":{life}")?;
        }
        Ok(())
    }
}
