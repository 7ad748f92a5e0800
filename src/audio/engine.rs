use anyhow::{anyhow, Context, Result};
use rodio::{OutputStream, OutputStreamHandle, Sink};
use std::sync::{
    mpsc::{self, Sender},
    Mutex,
};
use std::thread;

use super::{SoundCue, Tone};

enum CueCommand {
    Start,
    Beep,
    Stop,
}

/// Plays synthesised cues on a dedicated thread, since rodio's output stream
/// is not `Send`. The thread is spawned lazily on the first cue and exits when
/// the handle is dropped.
pub struct ToneCuePlayer {
    tx: Mutex<Option<Sender<CueCommand>>>,
    volume: f32,
}

struct CueOutput {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    start: Option<Sink>,
    beep: Option<Sink>,
    volume: f32,
}

impl CueOutput {
    fn open(volume: f32) -> Result<Self> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| anyhow!("Failed to create audio output stream: {e}"))?;
        Ok(Self {
            _stream: stream,
            handle,
            start: None,
            beep: None,
            volume,
        })
    }

    fn fresh_sink(&self) -> Result<Sink> {
        let sink =
            Sink::try_new(&self.handle).map_err(|e| anyhow!("Failed to create audio sink: {e}"))?;
        sink.set_volume(self.volume);
        Ok(sink)
    }

    fn stop_all(&mut self) {
        if let Some(old) = self.start.take() {
            old.stop();
        }
        if let Some(old) = self.beep.take() {
            old.stop();
        }
    }

    fn play_start(&mut self) -> Result<()> {
        self.stop_all();
        let sink = self.fresh_sink()?;
        for tone in Tone::start_cue() {
            sink.append(tone);
        }
        self.start = Some(sink);
        Ok(())
    }

    fn play_beep(&mut self) -> Result<()> {
        if let Some(old) = self.beep.take() {
            old.stop();
        }
        let sink = self.fresh_sink()?;
        sink.append(Tone::beep_cue());
        self.beep = Some(sink);
        Ok(())
    }
}

impl ToneCuePlayer {
    pub fn new(volume: f32) -> Self {
        Self {
            tx: Mutex::new(None),
            volume: volume.clamp(0.0, 1.0),
        }
    }

    fn ensure_thread(&self) -> Result<Sender<CueCommand>> {
        let mut guard = self
            .tx
            .lock()
            .map_err(|_| anyhow!("cue sender lock poisoned"))?;
        if let Some(tx) = guard.as_ref() {
            return Ok(tx.clone());
        }

        let (tx, rx) = mpsc::channel::<CueCommand>();
        let volume = self.volume;

        thread::Builder::new()
            .name("cue-audio".to_string())
            .spawn(move || {
                let mut output: Option<CueOutput> = None;

                while let Ok(cmd) = rx.recv() {
                    if output.is_none() {
                        match CueOutput::open(volume) {
                            Ok(opened) => output = Some(opened),
                            Err(err) => {
                                log::warn!("Cue audio unavailable: {err:#}");
                                continue;
                            }
                        }
                    }
                    let Some(out) = output.as_mut() else {
                        continue;
                    };

                    let result = match cmd {
                        CueCommand::Start => out.play_start(),
                        CueCommand::Beep => out.play_beep(),
                        CueCommand::Stop => {
                            out.stop_all();
                            Ok(())
                        }
                    };
                    if let Err(err) = result {
                        log::warn!("Cue playback failed: {err:#}");
                    }
                }
            })
            .context("failed to spawn cue audio thread")?;

        *guard = Some(tx.clone());
        Ok(tx)
    }

    fn send(&self, command: CueCommand) -> Result<()> {
        let tx = self.ensure_thread()?;
        tx.send(command)
            .map_err(|_| anyhow!("cue audio thread has exited"))
    }
}

impl SoundCue for ToneCuePlayer {
    fn play_start(&self) -> Result<()> {
        self.send(CueCommand::Start)
    }

    fn play_beep(&self) -> Result<()> {
        self.send(CueCommand::Beep)
    }

    fn stop(&self) -> Result<()> {
        // Nothing to stop if no cue was ever played.
        match self.tx.lock() {
            Ok(guard) => {
                if let Some(tx) = guard.as_ref() {
                    let _ = tx.send(CueCommand::Stop);
                }
                Ok(())
            }
            Err(_) => Err(anyhow!("cue sender lock poisoned")),
        }
    }
}
