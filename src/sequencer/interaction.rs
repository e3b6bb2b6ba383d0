// Pointer gestures over the timeline
//
// One gesture at a time. While a gesture is live, pointer moves only update
// an unsnapped preview; the session applies snapping when the gesture
// commits on release/drop.

use crate::sequencer::timeline::{ClipId, ResizeEdge, TrackId};
use crate::session::{Session, StudioError};

/// What is being dragged onto the timeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragPayload {
    /// A catalog sound, by id
    Sound(String),
    /// An existing clip
    Clip(ClipId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    Idle,
    DragSound { sound_id: String },
    /// `grab_offset` is pointer time minus clip start when the drag began
    MoveClip { clip_id: ClipId, grab_offset: f64 },
    Resize { clip_id: ClipId, edge: ResizeEdge },
}

/// Live feedback for the active gesture (never snapped)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GesturePreview {
    /// Time the gesture would commit at, before snapping
    pub time: f64,
    pub track: Option<TrackId>,
}

#[derive(Debug, thiserror::Error)]
pub enum GestureError {
    #[error("Another gesture is in progress")]
    Busy,

    #[error("No matching gesture in progress")]
    NoGesture,

    #[error("Unknown {0}")]
    UnknownClip(ClipId),

    #[error(transparent)]
    Studio(#[from] StudioError),
}

#[derive(Debug)]
pub struct InteractionController {
    gesture: Gesture,
    preview: Option<GesturePreview>,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionController {
    pub fn new() -> Self {
        Self {
            gesture: Gesture::Idle,
            preview: None,
        }
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn preview(&self) -> Option<GesturePreview> {
        self.preview
    }

    pub fn is_idle(&self) -> bool {
        self.gesture == Gesture::Idle
    }

    fn claim(&self) -> Result<(), GestureError> {
        if self.is_idle() {
            Ok(())
        } else {
            Err(GestureError::Busy)
        }
    }

    /// Start dragging a sound or a clip; `pointer_x` is where the pointer went down
    pub fn begin_drag(
        &mut self,
        payload: DragPayload,
        pointer_x: f64,
        session: &Session,
    ) -> Result<(), GestureError> {
        self.claim()?;

        self.gesture = match payload {
            DragPayload::Sound(sound_id) => Gesture::DragSound { sound_id },
            DragPayload::Clip(clip_id) => {
                let clip = session
                    .timeline()
                    .clip(clip_id)
                    .ok_or(GestureError::UnknownClip(clip_id))?;
                let pointer_time = session.time_scale().x_to_time(pointer_x);
                Gesture::MoveClip {
                    clip_id,
                    grab_offset: pointer_time - clip.start_time,
                }
            }
        };
        self.preview = None;
        Ok(())
    }

    /// Start dragging one edge of a clip
    pub fn begin_resize(
        &mut self,
        clip_id: ClipId,
        edge: ResizeEdge,
        session: &Session,
    ) -> Result<(), GestureError> {
        self.claim()?;
        if session.timeline().clip(clip_id).is_none() {
            return Err(GestureError::UnknownClip(clip_id));
        }
        self.gesture = Gesture::Resize { clip_id, edge };
        self.preview = None;
        Ok(())
    }

    fn gesture_time(&self, x: f64, session: &Session) -> f64 {
        let time = session.time_scale().x_to_time(x);
        match self.gesture {
            Gesture::MoveClip { grab_offset, .. } => (time - grab_offset).max(0.0),
            _ => time.max(0.0),
        }
    }

    /// Track the pointer; returns the unsnapped preview
    pub fn pointer_move(
        &mut self,
        x: f64,
        track: Option<TrackId>,
        session: &Session,
    ) -> Option<GesturePreview> {
        if self.is_idle() {
            return None;
        }
        self.preview = Some(GesturePreview {
            time: self.gesture_time(x, session),
            track,
        });
        self.preview
    }

    /// Drop a dragged sound or clip at pointer `x` over `track`
    ///
    /// A sound dropped with no target track lands on the first track, or
    /// on a new one if the timeline has none. A clip dropped with no target
    /// stays on its track.
    pub fn drop_at(
        &mut self,
        x: f64,
        track: Option<TrackId>,
        session: &mut Session,
    ) -> Result<ClipId, GestureError> {
        match self.gesture {
            Gesture::DragSound { .. } | Gesture::MoveClip { .. } => self.release(x, track, session),
            _ => Err(GestureError::NoGesture),
        }
    }

    /// Commit the active gesture at pointer `x` and return to idle
    ///
    /// The gesture ends even if the commit fails.
    pub fn release(
        &mut self,
        x: f64,
        track: Option<TrackId>,
        session: &mut Session,
    ) -> Result<ClipId, GestureError> {
        let time = self.gesture_time(x, session);
        let gesture = std::mem::replace(&mut self.gesture, Gesture::Idle);
        self.preview = None;

        match gesture {
            Gesture::Idle => Err(GestureError::NoGesture),
            Gesture::DragSound { sound_id } => {
                let target = track.or_else(|| session.timeline().tracks().first().map(|t| t.id));
                let track = match target {
                    Some(track) => track,
                    None => {
                        // An unknown sound must not leave an implicit track behind
                        session.lookup_sound(&sound_id)?;
                        session.add_track()
                    }
                };
                Ok(session.add_clip(&sound_id, track, time)?)
            }
            Gesture::MoveClip { clip_id, .. } => {
                let current = session
                    .timeline()
                    .clip(clip_id)
                    .map(|c| c.track_id)
                    .ok_or(GestureError::UnknownClip(clip_id))?;
                session.move_clip(clip_id, track.unwrap_or(current), time)?;
                Ok(clip_id)
            }
            Gesture::Resize { clip_id, edge } => {
                session.resize_clip(clip_id, edge, time)?;
                Ok(clip_id)
            }
        }
    }

    /// Abandon the active gesture without committing
    pub fn cancel(&mut self) {
        self.gesture = Gesture::Idle;
        self.preview = None;
    }

    /// Place a sound at the playhead on the first track
    pub fn double_click_sound(
        &mut self,
        sound_id: &str,
        session: &mut Session,
    ) -> Result<ClipId, GestureError> {
        self.claim()?;
        Ok(session.place_at_playhead(sound_id)?)
    }
}
