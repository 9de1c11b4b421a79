//! 地理空间类型模块
//!
//! 点、环、多边形与多多边形，对应各自的定长或长度前缀嵌套编码。

/// 平面坐标点
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl std::hash::Hash for Point {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.x.to_bits().hash(state);
        self.y.to_bits().hash(state);
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// 闭合环
pub type Ring = Vec<Point>;

/// 外环加若干内环
pub type Polygon = Vec<Ring>;

pub type MultiPolygon = Vec<Polygon>;
