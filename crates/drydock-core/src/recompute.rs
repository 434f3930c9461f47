//! Derived values.
//!
//! Values that depend on other installed systems (currently the cost of a
//! linked command/control system) are computed here from the resolved state and
//! never read from a document. A link whose target did not survive resolution
//! is cleared and reported.

use tracing::debug;

use crate::catalog::Category;
use crate::design::{ControlLink, DesignState, InstalledSystem, LinkKind};
use crate::report::MigrationReport;
use crate::resolve::PartialDesign;

/// Cost rules the recompute pass delegates to.
pub trait CostModel {
    /// Hull points occupied by an installed system.
    fn installed_hull_points(&self, system: &InstalledSystem) -> f64;

    /// Cost of a control system linked to a target occupying
    /// `target_hull_points`.
    fn linked_control_cost(&self, control: &InstalledSystem, target_hull_points: f64) -> f64;
}

/// Catalog-driven cost rules.
///
/// Linked cost is the control's own cost per unit times quantity, plus its
/// `linkedCostPerHullPoint` times the hull points of the target.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardCostModel;

impl CostModel for StandardCostModel {
    fn installed_hull_points(&self, system: &InstalledSystem) -> f64 {
        system.entry.hull_points * f64::from(system.quantity)
    }

    fn linked_control_cost(&self, control: &InstalledSystem, target_hull_points: f64) -> f64 {
        let base = control.entry.cost * f64::from(control.quantity);
        let per_hp = control.entry.linked_cost_per_hull_point.unwrap_or(0.0);
        base + per_hp * target_hull_points
    }
}

fn find_target<'a>(
    weapons: &'a [InstalledSystem],
    sensors: &'a [InstalledSystem],
    link: &ControlLink,
) -> Option<&'a InstalledSystem> {
    let pool = match link.kind {
        LinkKind::Weapon => weapons,
        LinkKind::Sensor => sensors,
    };
    pool.iter().find(|s| s.instance_id == link.instance_id)
}

/// Compute derived values and produce the final design state.
pub fn recompute(
    partial: PartialDesign,
    cost_model: &dyn CostModel,
    report: &mut MigrationReport,
) -> DesignState {
    let mut state = partial.into_state();
    let DesignState {
        command_control,
        weapons,
        sensors,
        ..
    } = &mut state;

    for control in command_control.iter_mut() {
        control.linked_cost = None;
        let Some(link) = control.link.as_ref() else {
            continue;
        };

        match find_target(weapons, sensors, link) {
            Some(target) => {
                let hp = cost_model.installed_hull_points(target);
                let cost = cost_model.linked_control_cost(&control.system, hp);
                debug!(
                    control = %control.system.instance_id,
                    target = %target.instance_id,
                    cost,
                    "linked cost computed"
                );
                control.linked_cost = Some(cost);
            }
            None => {
                report.warn(
                    Category::CommandControl,
                    format!(
                        "orphaned link dropped ('{}' has no {} '{}')",
                        control.system.instance_id,
                        link.kind.as_str(),
                        link.instance_id
                    ),
                );
                control.link = None;
            }
        }
    }

    state
}

/// Total hull points used by installed systems and armor.
pub fn used_hull_points(state: &DesignState, cost_model: &dyn CostModel) -> f64 {
    let systems: f64 = Category::installed()
        .flat_map(|c| state.installed(c))
        .map(|s| cost_model.installed_hull_points(s))
        .sum();
    let armor: f64 = state.armor_layers.iter().map(|l| l.armor.hull_points).sum();
    systems + armor
}
