use std::fmt;

use kurbo::Point;

use crate::foundation::core::{Color, Quat, Rect, Vec2, Vec3, Vec4};

/// Interpolation contract for animated value types.
pub trait Lerp: Sized {
    /// Interpolate from `a` to `b` with normalized factor `t` (nominally `[0, 1]`).
    fn lerp(a: &Self, b: &Self, t: f64) -> Self;
}

/// Catmull-Rom spline through `p1..p2`, shaped by the outer neighbours `p0` and `p3`.
pub trait CatmullRom: Sized {
    fn catmull_rom(p0: &Self, p1: &Self, p2: &Self, p3: &Self, t: f64) -> Self;
}

fn catmull_rom_f64(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * ((2.0 * p1)
        + (-p0 + p2) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (-p0 + 3.0 * p1 - 3.0 * p2 + p3) * t3)
}

impl Lerp for f64 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        a + (b - a) * t
    }
}

impl CatmullRom for f64 {
    fn catmull_rom(p0: &Self, p1: &Self, p2: &Self, p3: &Self, t: f64) -> Self {
        catmull_rom_f64(*p0, *p1, *p2, *p3, t)
    }
}

impl Lerp for Vec2 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        a.lerp(*b, t)
    }
}

impl CatmullRom for Vec2 {
    fn catmull_rom(p0: &Self, p1: &Self, p2: &Self, p3: &Self, t: f64) -> Self {
        Vec2::new(
            catmull_rom_f64(p0.x, p1.x, p2.x, p3.x, t),
            catmull_rom_f64(p0.y, p1.y, p2.y, p3.y, t),
        )
    }
}

impl Lerp for Vec3 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Vec3::new(
            a.x + (b.x - a.x) * t,
            a.y + (b.y - a.y) * t,
            a.z + (b.z - a.z) * t,
        )
    }
}

impl CatmullRom for Vec3 {
    fn catmull_rom(p0: &Self, p1: &Self, p2: &Self, p3: &Self, t: f64) -> Self {
        Vec3::new(
            catmull_rom_f64(p0.x, p1.x, p2.x, p3.x, t),
            catmull_rom_f64(p0.y, p1.y, p2.y, p3.y, t),
            catmull_rom_f64(p0.z, p1.z, p2.z, p3.z, t),
        )
    }
}

impl Lerp for Vec4 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Vec4::new(
            a.x + (b.x - a.x) * t,
            a.y + (b.y - a.y) * t,
            a.z + (b.z - a.z) * t,
            a.w + (b.w - a.w) * t,
        )
    }
}

impl CatmullRom for Vec4 {
    fn catmull_rom(p0: &Self, p1: &Self, p2: &Self, p3: &Self, t: f64) -> Self {
        Vec4::new(
            catmull_rom_f64(p0.x, p1.x, p2.x, p3.x, t),
            catmull_rom_f64(p0.y, p1.y, p2.y, p3.y, t),
            catmull_rom_f64(p0.z, p1.z, p2.z, p3.z, t),
            catmull_rom_f64(p0.w, p1.w, p2.w, p3.w, t),
        )
    }
}

/// Corner-wise blend, so inverted rectangles stay inverted.
impl Lerp for Rect {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        let p0 = Point::new(a.x0, a.y0).lerp(Point::new(b.x0, b.y0), t);
        let p1 = Point::new(a.x1, a.y1).lerp(Point::new(b.x1, b.y1), t);
        Rect::new(p0.x, p0.y, p1.x, p1.y)
    }
}

impl CatmullRom for Rect {
    fn catmull_rom(p0: &Self, p1: &Self, p2: &Self, p3: &Self, t: f64) -> Self {
        Rect::new(
            catmull_rom_f64(p0.x0, p1.x0, p2.x0, p3.x0, t),
            catmull_rom_f64(p0.y0, p1.y0, p2.y0, p3.y0, t),
            catmull_rom_f64(p0.x1, p1.x1, p2.x1, p3.x1, t),
            catmull_rom_f64(p0.y1, p1.y1, p2.y1, p3.y1, t),
        )
    }
}

impl Lerp for Color {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Color::new(
            a.r + (b.r - a.r) * t,
            a.g + (b.g - a.g) * t,
            a.b + (b.b - a.b) * t,
            a.a + (b.a - a.a) * t,
        )
    }
}

impl CatmullRom for Color {
    fn catmull_rom(p0: &Self, p1: &Self, p2: &Self, p3: &Self, t: f64) -> Self {
        // Overshoot is fine for vectors but not for channels.
        let ch = |a: f64, b: f64, c: f64, d: f64| catmull_rom_f64(a, b, c, d, t).clamp(0.0, 1.0);
        Color::new(
            ch(p0.r, p1.r, p2.r, p3.r),
            ch(p0.g, p1.g, p2.g, p3.g),
            ch(p0.b, p1.b, p2.b, p3.b),
            ch(p0.a, p1.a, p2.a, p3.a),
        )
    }
}

/// Shortest-path spherical interpolation.
impl Lerp for Quat {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        let mut b = *b;
        let mut cos = a.dot(b);
        if cos < 0.0 {
            b = -b;
            cos = -cos;
        }

        if cos > 0.9995 {
            // Nearly parallel: normalized linear blend avoids dividing by sin(~0).
            return Quat::new(
                a.x + (b.x - a.x) * t,
                a.y + (b.y - a.y) * t,
                a.z + (b.z - a.z) * t,
                a.w + (b.w - a.w) * t,
            )
            .normalize();
        }

        let theta = cos.acos();
        let sin = theta.sin();
        let wa = ((1.0 - t) * theta).sin() / sin;
        let wb = (t * theta).sin() / sin;
        Quat::new(
            wa * a.x + wb * b.x,
            wa * a.y + wb * b.y,
            wa * a.z + wb * b.z,
            wa * a.w + wb * b.w,
        )
    }
}

impl CatmullRom for Quat {
    fn catmull_rom(_p0: &Self, p1: &Self, p2: &Self, _p3: &Self, t: f64) -> Self {
        <Quat as Lerp>::lerp(p1, p2, t)
    }
}

/// Declared value type of a track.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Single,
    Vector2,
    Vector3,
    Vector4,
    Quaternion,
    Rectangle,
    Color,
}

impl ValueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Vector2 => "vector2",
            Self::Vector3 => "vector3",
            Self::Vector4 => "vector4",
            Self::Quaternion => "quaternion",
            Self::Rectangle => "rectangle",
            Self::Color => "color",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyframe payload. The variant is the value's [`ValueKind`].
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyValue {
    Single(f64),
    Vector2(Vec2),
    Vector3(Vec3),
    Vector4(Vec4),
    Quaternion(Quat),
    Rectangle(Rect),
    Color(Color),
}

impl KeyValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Single(_) => ValueKind::Single,
            Self::Vector2(_) => ValueKind::Vector2,
            Self::Vector3(_) => ValueKind::Vector3,
            Self::Vector4(_) => ValueKind::Vector4,
            Self::Quaternion(_) => ValueKind::Quaternion,
            Self::Rectangle(_) => ValueKind::Rectangle,
            Self::Color(_) => ValueKind::Color,
        }
    }

    /// Blend toward `other`. `None` when the two values are of different kinds.
    pub fn lerp(&self, other: &Self, t: f64) -> Option<Self> {
        Some(match (self, other) {
            (Self::Single(a), Self::Single(b)) => Self::Single(<f64 as Lerp>::lerp(a, b, t)),
            (Self::Vector2(a), Self::Vector2(b)) => Self::Vector2(Lerp::lerp(a, b, t)),
            (Self::Vector3(a), Self::Vector3(b)) => Self::Vector3(Lerp::lerp(a, b, t)),
            (Self::Vector4(a), Self::Vector4(b)) => Self::Vector4(Lerp::lerp(a, b, t)),
            (Self::Quaternion(a), Self::Quaternion(b)) => Self::Quaternion(Lerp::lerp(a, b, t)),
            (Self::Rectangle(a), Self::Rectangle(b)) => Self::Rectangle(Lerp::lerp(a, b, t)),
            (Self::Color(a), Self::Color(b)) => Self::Color(Lerp::lerp(a, b, t)),
            _ => return None,
        })
    }

    /// Catmull-Rom segment from `p1` to `p2`. `None` unless all four values share a kind.
    pub fn catmull_rom(p0: &Self, p1: &Self, p2: &Self, p3: &Self, t: f64) -> Option<Self> {
        Some(match (p0, p1, p2, p3) {
            (Self::Single(a), Self::Single(b), Self::Single(c), Self::Single(d)) => {
                Self::Single(<f64 as CatmullRom>::catmull_rom(a, b, c, d, t))
            }
            (Self::Vector2(a), Self::Vector2(b), Self::Vector2(c), Self::Vector2(d)) => {
                Self::Vector2(CatmullRom::catmull_rom(a, b, c, d, t))
            }
            (Self::Vector3(a), Self::Vector3(b), Self::Vector3(c), Self::Vector3(d)) => {
                Self::Vector3(CatmullRom::catmull_rom(a, b, c, d, t))
            }
            (Self::Vector4(a), Self::Vector4(b), Self::Vector4(c), Self::Vector4(d)) => {
                Self::Vector4(CatmullRom::catmull_rom(a, b, c, d, t))
            }
            (Self::Quaternion(a), Self::Quaternion(b), Self::Quaternion(c), Self::Quaternion(d)) => {
                Self::Quaternion(CatmullRom::catmull_rom(a, b, c, d, t))
            }
            (Self::Rectangle(a), Self::Rectangle(b), Self::Rectangle(c), Self::Rectangle(d)) => {
                Self::Rectangle(CatmullRom::catmull_rom(a, b, c, d, t))
            }
            (Self::Color(a), Self::Color(b), Self::Color(c), Self::Color(d)) => {
                Self::Color(CatmullRom::catmull_rom(a, b, c, d, t))
            }
            _ => return None,
        })
    }

    pub fn as_single(&self) -> Option<f64> {
        match self {
            Self::Single(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_vector2(&self) -> Option<Vec2> {
        match self {
            Self::Vector2(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            Self::Color(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<f64> for KeyValue {
    fn from(v: f64) -> Self {
        Self::Single(v)
    }
}

impl From<Vec2> for KeyValue {
    fn from(v: Vec2) -> Self {
        Self::Vector2(v)
    }
}

impl From<Vec3> for KeyValue {
    fn from(v: Vec3) -> Self {
        Self::Vector3(v)
    }
}

impl From<Vec4> for KeyValue {
    fn from(v: Vec4) -> Self {
        Self::Vector4(v)
    }
}

impl From<Quat> for KeyValue {
    fn from(v: Quat) -> Self {
        Self::Quaternion(v)
    }
}

impl From<Rect> for KeyValue {
    fn from(v: Rect) -> Self {
        Self::Rectangle(v)
    }
}

impl From<Color> for KeyValue {
    fn from(v: Color) -> Self {
        Self::Color(v)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/value.rs"]
mod tests;
