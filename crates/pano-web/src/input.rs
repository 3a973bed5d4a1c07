use glam::Vec2;

/// Movement (backing-store pixels) below which a press still counts as a click.
pub const CLICK_SLOP_PX: f32 = 6.0;

/// What a pointer event means for the camera and the scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Gesture {
    Hover(Vec2),
    DragStart(Vec2),
    DragTo(Vec2),
    DragEnd,
    PinchStart,
    /// Current finger distance over the distance at pinch start.
    PinchTo(f32),
    PinchEnd,
    /// Press and release without moving: the pointer went up here.
    Click(Vec2),
    Ignored,
}

#[derive(Clone, Copy, Debug)]
struct Press {
    start: Vec2,
    moved: bool,
}

/// Turns raw pointer events (mouse, pen and touch alike) into drag, pinch and
/// click gestures.
#[derive(Clone, Debug, Default)]
pub struct PointerTracker {
    pointers: Vec<(i32, Vec2)>,
    press: Option<Press>,
    pinch_base: Option<f32>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> usize {
        self.pointers.len()
    }

    /// Position of the first pointer still down.
    pub fn primary(&self) -> Option<Vec2> {
        self.pointers.first().map(|(_, px)| *px)
    }

    fn pinch_distance(&self) -> Option<f32> {
        match self.pointers.as_slice() {
            [(_, a), (_, b), ..] => Some(a.distance(*b)),
            _ => None,
        }
    }

    pub fn down(&mut self, id: i32, px: Vec2) -> Gesture {
        self.pointers.retain(|(p, _)| *p != id);
        self.pointers.push((id, px));
        match self.pointers.len() {
            1 => {
                self.press = Some(Press {
                    start: px,
                    moved: false,
                });
                Gesture::DragStart(px)
            }
            2 => {
                // A second finger can never end in a click.
                if let Some(press) = &mut self.press {
                    press.moved = true;
                }
                self.pinch_base = self.pinch_distance().filter(|d| *d > 1.0);
                Gesture::PinchStart
            }
            _ => Gesture::Ignored,
        }
    }

    pub fn move_to(&mut self, id: i32, px: Vec2) -> Gesture {
        let Some(slot) = self.pointers.iter_mut().find(|(p, _)| *p == id) else {
            return Gesture::Hover(px);
        };
        slot.1 = px;
        if let Some(base) = self.pinch_base {
            return match self.pinch_distance() {
                Some(d) => Gesture::PinchTo(d / base),
                None => Gesture::Ignored,
            };
        }
        if self.pointers.len() > 1 {
            return Gesture::Ignored;
        }
        if let Some(press) = &mut self.press {
            if press.start.distance(px) > CLICK_SLOP_PX {
                press.moved = true;
            }
        }
        Gesture::DragTo(px)
    }

    pub fn up(&mut self, id: i32, px: Vec2) -> Gesture {
        self.release(id, Some(px))
    }

    /// The browser took the pointer away (scroll, palm rejection): never a click.
    pub fn cancel(&mut self, id: i32) -> Gesture {
        self.release(id, None)
    }

    fn release(&mut self, id: i32, px: Option<Vec2>) -> Gesture {
        let before = self.pointers.len();
        self.pointers.retain(|(p, _)| *p != id);
        if self.pointers.len() == before {
            return Gesture::Ignored;
        }
        if self.pinch_base.is_some() && self.pointers.len() < 2 {
            self.pinch_base = None;
            return Gesture::PinchEnd;
        }
        if !self.pointers.is_empty() {
            return Gesture::Ignored;
        }
        match (self.press.take(), px) {
            (Some(press), Some(px)) if !press.moved => Gesture::Click(px),
            (Some(_), _) => Gesture::DragEnd,
            (None, _) => Gesture::Ignored,
        }
    }
}

/// Convert CSS client coordinates into canvas backing-store pixels.
#[inline]
pub fn client_to_canvas_px(
    client: Vec2,
    rect_origin: Vec2,
    rect_size: Vec2,
    backing_size: Vec2,
) -> Vec2 {
    if rect_size.x <= 0.0 || rect_size.y <= 0.0 {
        return Vec2::ZERO;
    }
    (client - rect_origin) / rect_size * backing_size
}
