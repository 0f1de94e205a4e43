use std::collections::HashMap;
use std::path::PathBuf;

use gtk4 as gtk;
use gtk4::prelude::*;

use crate::config::SoundSettings;
use crate::feedback::{AudioSink, FeedbackError};
use crate::game::Cue;

const MUSIC_FILE: &str = "ambient_music.mp3";

/// Sound effects and looping music through `gtk::MediaFile`.
pub struct MediaAudio {
    sounds_dir: PathBuf,
    settings: SoundSettings,
    enabled: bool,
    ducked: bool,
    samples: HashMap<&'static str, gtk::MediaFile>,
    music: Option<gtk::MediaFile>,
}

impl MediaAudio {
    pub fn new(sounds_dir: PathBuf, settings: SoundSettings) -> Self {
        let enabled = settings.enabled;
        Self {
            sounds_dir,
            settings,
            enabled,
            ducked: false,
            samples: HashMap::new(),
            music: None,
        }
    }

    fn open(&self, file_name: &str) -> Result<gtk::MediaFile, FeedbackError> {
        let path = self.sounds_dir.join(file_name);
        if !path.exists() {
            return Err(FeedbackError::MissingSample(path.display().to_string()));
        }
        Ok(gtk::MediaFile::for_filename(&path))
    }

    fn sample(&mut self, name: &'static str) -> Result<gtk::MediaFile, FeedbackError> {
        if let Some(media) = self.samples.get(name) {
            return Ok(media.clone());
        }
        let media = self.open(&format!("{name}.wav"))?;
        media.set_volume(self.settings.sfx_volume);
        self.samples.insert(name, media.clone());
        Ok(media)
    }

    fn music_volume(&self) -> f64 {
        if self.ducked {
            self.settings.ducked_volume
        } else {
            self.settings.ambient_volume
        }
    }

    fn start_music(&mut self) -> Result<(), FeedbackError> {
        if self.music.is_none() {
            let music = self.open(MUSIC_FILE)?;
            music.set_loop(true);
            self.music = Some(music);
        }
        let volume = self.music_volume();
        if let Some(music) = &self.music {
            music.set_volume(volume);
            if self.enabled && !music.is_playing() {
                music.play();
            }
        }
        Ok(())
    }

    fn duck(&mut self, ducked: bool) {
        self.ducked = ducked;
        let volume = self.music_volume();
        if let Some(music) = &self.music {
            music.set_volume(volume);
        }
    }
}

impl AudioSink for MediaAudio {
    fn play(&mut self, cue: Cue) -> Result<(), FeedbackError> {
        match cue {
            Cue::MusicStart => return self.start_music(),
            Cue::MusicDuck => self.duck(true),
            Cue::MusicRestore => self.duck(false),
            _ => {}
        }
        if !self.enabled {
            return Ok(());
        }
        let Some(name) = cue.sample_name() else {
            return Ok(());
        };
        let media = self.sample(name)?;
        media.seek(0);
        media.play();
        Ok(())
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if let Some(music) = &self.music {
            if enabled {
                music.play();
            } else {
                music.pause();
            }
        }
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}
