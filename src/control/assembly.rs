//! The set of blocks carried by a flying craft and their geometry.

use std::f64::consts::FRAC_PI_2;

use glam::{DQuat, DVec3, IVec3};
use serde::{Deserialize, Serialize};

use crate::control::fuel_management::PropellantTanks;
use crate::control::pilot::Cardinal;
use crate::control::propulsion::ThrusterSpec;
use crate::errors::SimulationError;
use crate::trajectory_system::kinematics::Aabb;
use crate::utils::vector_math::yaw_of;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum BlockKind {
    Structure,
    HydrogenTank,
    OxygenTank,
    Thruster(ThrusterSpec),
    RocketController,
}

/// One block of a craft as handed over by the host.
///
/// `position` is a world position when the craft is assembled and an offset
/// from the craft's center block afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedBlock {
    pub position: IVec3,
    pub kind: BlockKind,
    pub block_id: String,
    /// Dry mass, kg.
    pub mass: f64,
    pub stored_fluid: f64,
    pub storage_capacity: f64,
    pub place_first: bool,
    pub redstone_powered: bool,
}

impl CapturedBlock {
    pub fn structure(position: IVec3, block_id: &str, mass: f64) -> Self {
        CapturedBlock {
            position,
            kind: BlockKind::Structure,
            block_id: block_id.to_string(),
            mass,
            stored_fluid: 0.0,
            storage_capacity: 0.0,
            place_first: false,
            redstone_powered: false,
        }
    }

    pub fn hydrogen_tank(position: IVec3, mass: f64, stored: f64, capacity: f64) -> Self {
        CapturedBlock {
            kind: BlockKind::HydrogenTank,
            stored_fluid: stored,
            storage_capacity: capacity,
            place_first: true,
            ..Self::structure(position, "hydrogen_tank", mass)
        }
    }

    pub fn oxygen_tank(position: IVec3, mass: f64, stored: f64, capacity: f64) -> Self {
        CapturedBlock {
            kind: BlockKind::OxygenTank,
            stored_fluid: stored,
            storage_capacity: capacity,
            place_first: true,
            ..Self::structure(position, "oxygen_tank", mass)
        }
    }

    pub fn thruster(position: IVec3, mass: f64, spec: ThrusterSpec) -> Self {
        CapturedBlock {
            kind: BlockKind::Thruster(spec),
            ..Self::structure(position, "rocket_thruster", mass)
        }
    }

    pub fn controller(position: IVec3, mass: f64) -> Self {
        CapturedBlock {
            kind: BlockKind::RocketController,
            place_first: true,
            ..Self::structure(position, "rocket_controller", mass)
        }
    }

    pub fn powered(mut self) -> Self {
        self.redstone_powered = true;
        self
    }

    pub fn is_tank(&self) -> bool {
        matches!(self.kind, BlockKind::HydrogenTank | BlockKind::OxygenTank)
    }

    /// Dry mass plus any fluid it holds.
    pub fn total_mass(&self) -> f64 {
        if self.is_tank() {
            self.mass + self.stored_fluid
        } else {
            self.mass
        }
    }

    /// Thruster performance, unless the thruster is shut off by redstone.
    pub fn active_thruster(&self) -> Option<&ThrusterSpec> {
        match &self.kind {
            BlockKind::Thruster(spec) if !self.redstone_powered => Some(spec),
            _ => None,
        }
    }
}

/// Blocks and bounding geometry of a craft, relative to its center block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlyingAssembly {
    pub blocks: Vec<CapturedBlock>,
    pub forward: Cardinal,
    pub lower_height: f64,
    pub upper_height: f64,
    pub max_width: f64,
}

/// Result of capturing blocks from the world.
#[derive(Debug, Clone, PartialEq)]
pub struct Capture {
    pub assembly: FlyingAssembly,
    pub center_block: IVec3,
    pub center_of_mass: DVec3,
    pub mass: f64,
}

impl Capture {
    /// Where the craft entity starts: centered on the center block's column.
    pub fn spawn_position(&self) -> DVec3 {
        DVec3::new(
            self.center_of_mass.x.floor() + 0.5,
            self.center_of_mass.y.floor(),
            self.center_of_mass.z.floor() + 0.5,
        )
    }
}

impl FlyingAssembly {
    /// Turns world-positioned blocks into a craft centered on the block that
    /// holds its center of mass.
    pub fn capture(blocks: Vec<CapturedBlock>, forward: Cardinal) -> Result<Capture, SimulationError> {
        let Some(first) = blocks.first() else {
            return Err(SimulationError::PreconditionViolation(
                "cannot assemble a craft without blocks".to_string(),
            ));
        };

        let mut min = first.position;
        let mut max = first.position;
        let mut mass = 0.0;
        let mut moment = DVec3::ZERO;
        for block in &blocks {
            min = min.min(block.position);
            max = max.max(block.position);
            let block_mass = block.total_mass();
            mass += block_mass;
            moment += block.position.as_dvec3() * block_mass;
        }

        if !(mass > 0.0 && mass.is_finite()) {
            return Err(SimulationError::ArithmeticDomainError(format!(
                "craft mass must be positive, got {mass}"
            )));
        }

        let center_of_mass = moment / mass;
        let center_block = center_of_mass.floor().as_ivec3();
        let lower_height = f64::from(center_block.y - min.y);
        let upper_height = f64::from(max.y - center_block.y);
        let max_width = f64::from(
            (center_block.x - min.x).abs()
                + (center_block.x - max.x).abs()
                + (center_block.z - min.z).abs()
                + (center_block.z - max.z).abs(),
        ) / 4.0;

        let blocks = blocks
            .into_iter()
            .map(|mut block| {
                block.position -= center_block;
                block
            })
            .collect();

        Ok(Capture {
            assembly: FlyingAssembly {
                blocks,
                forward,
                lower_height,
                upper_height,
                max_width,
            },
            center_block,
            center_of_mass,
            mass,
        })
    }

    pub fn thrusters(&self) -> impl Iterator<Item = &ThrusterSpec> {
        self.blocks.iter().filter_map(CapturedBlock::active_thruster)
    }

    pub fn tanks(&self) -> PropellantTanks {
        PropellantTanks::from_blocks(&self.blocks)
    }

    pub fn bounding_box(&self, position: DVec3) -> Aabb {
        Aabb {
            min: position - DVec3::new(self.max_width, self.lower_height, self.max_width),
            max: position + DVec3::new(self.max_width, self.upper_height, self.max_width),
        }
    }

    /// Splits the blocks into the two placement batches. Unpowered tanks in
    /// the first batch are refilled with their share of what is left.
    pub fn release_batches(&self, tanks: &PropellantTanks) -> (Vec<CapturedBlock>, Vec<CapturedBlock>) {
        let (mut first, last): (Vec<_>, Vec<_>) =
            self.blocks.iter().cloned().partition(|block| block.place_first);

        for block in first.iter_mut() {
            if block.redstone_powered || block.stored_fluid <= 0.0 {
                continue;
            }
            let fraction = match block.kind {
                BlockKind::HydrogenTank => tanks.hydrogen_level(),
                BlockKind::OxygenTank => tanks.oxygen_level(),
                _ => continue,
            };
            block.stored_fluid = block.storage_capacity * fraction.max(0.0);
        }
        (first, last)
    }
}

/// Quarter turns about Y nearest to the craft's heading.
pub fn rotation_steps(orientation: DQuat) -> u8 {
    ((yaw_of(orientation) / FRAC_PI_2).round() as i32).rem_euclid(4) as u8
}
