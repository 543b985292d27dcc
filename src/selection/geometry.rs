use eframe::egui::{Pos2, Rect, Vec2};

/// A screen-space area drawn by the user in box or lasso mode.
#[derive(Clone, Debug, PartialEq)]
pub enum Region {
    Box(Rect),
    Lasso(Vec<Pos2>),
}

impl Region {
    pub fn from_corners(start: Pos2, end: Pos2) -> Self {
        Self::Box(Rect::from_two_pos(start, end))
    }

    pub fn contains(&self, point: Pos2) -> bool {
        match self {
            Self::Box(rect) => rect.contains(point),
            Self::Lasso(polygon) => point_in_polygon(point, polygon),
        }
    }

    pub fn translate(&mut self, delta: Vec2) {
        match self {
            Self::Box(rect) => *rect = rect.translate(delta),
            Self::Lasso(polygon) => polygon.iter_mut().for_each(|point| *point += delta),
        }
    }

    /// Too small to be anything but an accidental drag.
    pub fn is_degenerate(&self) -> bool {
        match self {
            Self::Box(rect) => rect.width() < 2.0 && rect.height() < 2.0,
            Self::Lasso(polygon) => polygon.len() < 3,
        }
    }
}

/// Even-odd ray casting. Polygons with fewer than three vertices contain nothing.
pub fn point_in_polygon(point: Pos2, polygon: &[Pos2]) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut previous = polygon[polygon.len() - 1];
    for &current in polygon {
        let crosses = (current.y > point.y) != (previous.y > point.y);
        if crosses {
            let intersection_x =
                (previous.x - current.x) * (point.y - current.y) / (previous.y - current.y) + current.x;
            if point.x < intersection_x {
                inside = !inside;
            }
        }
        previous = current;
    }
    inside
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use super::*;

    #[test]
    fn lasso_handles_concave_shapes() {
        // U shape opening upwards.
        let polygon = [
            pos2(0.0, 0.0),
            pos2(30.0, 0.0),
            pos2(30.0, 30.0),
            pos2(20.0, 30.0),
            pos2(20.0, 10.0),
            pos2(10.0, 10.0),
            pos2(10.0, 30.0),
            pos2(0.0, 30.0),
        ];
        assert!(point_in_polygon(pos2(5.0, 20.0), &polygon));
        assert!(point_in_polygon(pos2(15.0, 5.0), &polygon));
        assert!(!point_in_polygon(pos2(15.0, 20.0), &polygon));
        assert!(!point_in_polygon(pos2(40.0, 5.0), &polygon));
    }

    #[test]
    fn degenerate_polygons_contain_nothing() {
        assert!(!point_in_polygon(pos2(0.0, 0.0), &[pos2(0.0, 0.0), pos2(1.0, 1.0)]));
    }

    #[test]
    fn box_from_any_corner_order() {
        let region = Region::from_corners(pos2(10.0, 10.0), pos2(0.0, 0.0));
        assert!(region.contains(pos2(5.0, 5.0)));
        assert!(!region.contains(pos2(11.0, 5.0)));
    }
}
