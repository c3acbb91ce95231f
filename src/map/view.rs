use std::sync::mpsc::{Receiver, Sender};

use egui::{Color32, Pos2, Rect, Sense, Stroke, Ui, Vec2};

use super::{coordinates::WGS84Coordinate, geometry::Geometry, map_event::MapEvent};

const TILE_SIZE: f64 = 256.;
pub const MAX_ZOOM: u8 = 19;
const DEFAULT_ZOOM: u8 = 2;

/// Minimal map view that follows `MapEvent`s: it keeps a center and a tile zoom level and draws
/// the geometry it was last sent to.
pub struct MapView {
  recv: Receiver<MapEvent>,
  center: WGS84Coordinate,
  zoom: u8,
  target: Option<Geometry>,
}

impl MapView {
  /// Creates the view and the handle other components use to control it.
  #[must_use]
  pub fn new() -> (Self, Sender<MapEvent>) {
    let (send, recv) = std::sync::mpsc::channel();
    (
      Self {
        recv,
        center: WGS84Coordinate::new(0., 0.),
        zoom: DEFAULT_ZOOM,
        target: None,
      },
      send,
    )
  }

  #[must_use]
  pub fn center(&self) -> WGS84Coordinate {
    self.center
  }

  #[must_use]
  pub fn zoom(&self) -> u8 {
    self.zoom
  }

  #[must_use]
  pub fn target(&self) -> Option<&Geometry> {
    self.target.as_ref()
  }

  /// Applies all events received since the last call.
  pub fn handle_map_events(&mut self) {
    let events = self.recv.try_iter().collect::<Vec<_>>();
    for event in events {
      match event {
        MapEvent::GoTo { target, zoom } => self.go_to(target, zoom),
      }
    }
  }

  fn go_to(&mut self, target: Geometry, zoom: u8) {
    let Some(center) = target.center() else {
      log::warn!("Ignoring GoTo for a {} without coordinates", target.type_name());
      return;
    };
    self.center = center;
    self.zoom = zoom.min(MAX_ZOOM);
    self.target = Some(target);
    log::info!(
      "Focused on coordinate: {:.4}, {:.4} with tile zoom: {}",
      center.lat,
      center.lon,
      self.zoom
    );
  }

  /// Web mercator pixel position of a coordinate at the current zoom.
  fn project(&self, coord: WGS84Coordinate) -> Pos2 {
    let scale = TILE_SIZE * 2f64.powi(i32::from(self.zoom));
    let lat = f64::from(coord.lat).clamp(-85.0511, 85.0511).to_radians();
    let x = (f64::from(coord.lon) + 180.) / 360. * scale;
    let y = (1. - lat.tan().asinh() / std::f64::consts::PI) / 2. * scale;
    #[allow(clippy::cast_possible_truncation)]
    Pos2::new(x as f32, y as f32)
  }

  fn to_screen(&self, coord: WGS84Coordinate, rect: Rect) -> Pos2 {
    let offset: Vec2 = self.project(coord) - self.project(self.center);
    rect.center() + offset
  }

  pub fn ui(&mut self, ui: &mut Ui) {
    self.handle_map_events();

    ui.horizontal(|ui| {
      ui.label(format!(
        "Center: {:.5}, {:.5}",
        self.center.lat, self.center.lon
      ));
      ui.separator();
      ui.label(format!("Zoom: {}", self.zoom));
    });

    let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::hover());
    let rect = response.rect;
    painter.rect_filled(rect, 0., ui.visuals().extreme_bg_color);

    let stroke = Stroke::new(2., Color32::RED);
    match &self.target {
      Some(Geometry::Point(coord)) => {
        painter.circle_filled(self.to_screen(*coord, rect), 5., Color32::RED);
      }
      Some(Geometry::MultiPoint(coords)) => {
        for coord in coords {
          painter.circle_filled(self.to_screen(*coord, rect), 4., Color32::RED);
        }
      }
      Some(Geometry::LineString(paths)) => {
        for path in paths {
          let points = path.iter().map(|c| self.to_screen(*c, rect)).collect();
          painter.add(egui::Shape::line(points, stroke));
        }
      }
      Some(Geometry::Polygon(rings)) => {
        for ring in rings {
          let points = ring.iter().map(|c| self.to_screen(*c, rect)).collect();
          painter.add(egui::Shape::closed_line(points, stroke));
        }
      }
      None => {
        painter.text(
          rect.center(),
          egui::Align2::CENTER_CENTER,
          "Select a feature to locate it",
          egui::FontId::proportional(14.),
          ui.visuals().weak_text_color(),
        );
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn go_to_moves_center_and_zoom() {
    let (mut view, sender) = MapView::new();
    let target = Geometry::Point(WGS84Coordinate::new(52.5, 13.4));
    sender
      .send(MapEvent::GoTo {
        target: target.clone(),
        zoom: 14,
      })
      .expect("view is alive");

    view.handle_map_events();

    assert_eq!(view.center(), WGS84Coordinate::new(52.5, 13.4));
    assert_eq!(view.zoom(), 14);
    assert_eq!(view.target(), Some(&target));
  }

  #[test]
  fn empty_geometry_is_ignored() {
    let (mut view, sender) = MapView::new();
    sender
      .send(MapEvent::GoTo {
        target: Geometry::MultiPoint(vec![]),
        zoom: 14,
      })
      .expect("view is alive");

    view.handle_map_events();

    assert_eq!(view.zoom(), DEFAULT_ZOOM);
    assert!(view.target().is_none());
  }

  #[test]
  fn center_projects_to_rect_center() {
    let (view, _sender) = MapView::new();
    let rect = Rect::from_min_size(Pos2::ZERO, Vec2::new(200., 100.));
    let pos = view.to_screen(view.center(), rect);
    assert_eq!(pos, rect.center());
  }
}
