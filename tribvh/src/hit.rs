use crate::TriangleId;

/// Result of a nearest-hit query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
    pub distance: f32,
    pub triangle_id: Option<TriangleId>,
}

impl Hit {
    pub fn new(distance: f32, triangle_id: TriangleId) -> Self {
        Self {
            distance,
            triangle_id: Some(triangle_id),
        }
    }

    pub fn none() -> Self {
        Self {
            distance: f32::INFINITY,
            triangle_id: None,
        }
    }

    pub fn is_some(&self) -> bool {
        self.triangle_id.is_some()
    }

    pub fn is_none(&self) -> bool {
        !self.is_some()
    }

    /// Replaces `self` with a hit at `distance` if it's strictly closer;
    /// returns whether that happened.
    pub fn try_replace(
        &mut self,
        distance: f32,
        triangle_id: TriangleId,
    ) -> bool {
        if distance < self.distance {
            *self = Self::new(distance, triangle_id);
            true
        } else {
            false
        }
    }
}

impl Default for Hit {
    fn default() -> Self {
        Self::none()
    }
}
