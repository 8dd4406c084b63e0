#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(pub u64);

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Self) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn midpoint(self, other: Self) -> Self {
        Self {
            x: (self.x + other.x) * 0.5,
            y: (self.y + other.y) * 0.5,
        }
    }

    pub fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

impl Facing {
    pub fn sign(self) -> f32 {
        match self {
            Self::Left => -1.0,
            Self::Right => 1.0,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    pub fn from_right(is_right: bool) -> Self {
        if is_right {
            Self::Right
        } else {
            Self::Left
        }
    }

    pub fn is_right(self) -> bool {
        matches!(self, Self::Right)
    }

    /// Facing angle in radians, as the presentation layer expects it.
    pub fn angle_radians(self) -> f32 {
        match self {
            Self::Left => std::f32::consts::PI,
            Self::Right => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const POSSESSED: Self = Self::rgb(170, 120, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Positional state shared by everything placed in a level.
///
/// Only `x` and `level` are simulation state; `y` is derived from the floor
/// level so objects on one floor always line up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub level: u32,
    pub angle: f32,
    pub color: Color,
    pub velocity: f32,
}

impl Placement {
    pub fn at(x: f32, level: u32) -> Self {
        Self {
            x,
            level,
            angle: 0.0,
            color: Color::default(),
            velocity: 0.0,
        }
    }

    pub fn y(&self, floor_height: f32) -> f32 {
        self.level as f32 * floor_height
    }

    pub fn position(&self, floor_height: f32) -> Vec2 {
        Vec2 {
            x: self.x,
            y: self.y(floor_height),
        }
    }

    pub fn same_level(&self, other: &Placement) -> bool {
        self.level == other.level
    }

    pub fn horizontal_distance(&self, other: &Placement) -> f32 {
        (other.x - self.x).abs()
    }

    pub fn face(&mut self, facing: Facing) {
        self.angle = facing.angle_radians();
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub(crate) fn alloc(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}
