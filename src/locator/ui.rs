use std::hash::Hash;

use egui::{Button, RichText, Ui};

use super::{
  Action,
  view::{DisplayTree, ListContent, RETRY_TEXT},
};

/// Draws the tree and returns the action the user triggered this frame, if any. `id_salt` must
/// differ between locators drawn in the same `Ui`.
pub fn show(ui: &mut Ui, id_salt: impl Hash, tree: &DisplayTree) -> Option<Action> {
  let mut action = None;

  ui.push_id(id_salt, |ui| {
    ui.horizontal(|ui| {
      let hover = if tree.toggle.expanded {
        "Hide features"
      } else {
        "Show features"
      };
      if ui
        .add(Button::new(tree.toggle.icon.glyph()).frame(false))
        .on_hover_text(hover)
        .clicked()
      {
        action = Some(Action::Toggle);
      }
      ui.label(RichText::new(&tree.label).strong());
    });

    if tree.list.hidden {
      return;
    }

    ui.indent("features", |ui| match &tree.list.content {
      ListContent::Rows(rows) => {
        for row in rows {
          match &row.action {
            Some(row_action) => {
              if ui.button(&row.label).clicked() {
                action = Some(row_action.clone());
              }
            }
            None => {
              ui.add_enabled(false, Button::new(&row.label))
                .on_disabled_hover_text("Feature has no id");
            }
          }
        }
      }
      ListContent::Failed { retry, .. } => {
        if let Some(text) = tree.list.content.placeholder() {
          ui.colored_label(ui.visuals().error_fg_color, text);
        }
        if ui.small_button(RETRY_TEXT).clicked() {
          action = Some(retry.clone());
        }
      }
      content => {
        if let Some(text) = content.placeholder() {
          ui.weak(text);
        }
      }
    });
  });

  action
}
