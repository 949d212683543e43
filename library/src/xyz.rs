use core::iter::once;

use crate::config::{X1_LIMIT_BIT, X_DIRECTION_BIT, X_STEP_BIT, Y1_LIMIT_BIT, Y_DIRECTION_BIT, Y_STEP_BIT, Z1_LIMIT_BIT, Z_DIRECTION_BIT, Z_STEP_BIT};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum XYZId { X, Y, Z }
pub static XYZ_ID_LIST:[XYZId;3] = [XYZId::X, XYZId::Y, XYZId::Z];

impl XYZId {
    pub const fn step_bit(self) -> u8 {
        match self {
            XYZId::X => 1 << X_STEP_BIT,
            XYZId::Y => 1 << Y_STEP_BIT,
            XYZId::Z => 1 << Z_STEP_BIT,
        }
    }

    pub const fn direction_bit(self) -> u8 {
        match self {
            XYZId::X => 1 << X_DIRECTION_BIT,
            XYZId::Y => 1 << Y_DIRECTION_BIT,
            XYZId::Z => 1 << Z_DIRECTION_BIT,
        }
    }

    /// Bit of the switch at the low end of the axis, the one homing drives into.
    pub const fn limit_bit(self) -> u8 {
        match self {
            XYZId::X => 1 << X1_LIMIT_BIT,
            XYZId::Y => 1 << Y1_LIMIT_BIT,
            XYZId::Z => 1 << Z1_LIMIT_BIT,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct XYZData<T> {
    pub x: T,
    pub y: T,
    pub z: T,
}

impl<T> Default for XYZData<T> where T: Default {
    fn default() -> Self {
        return Self {
            x: Default::default(),
            y: Default::default(),
            z: Default::default(),
        }
    }
}

impl<T> XYZData<T> {
    pub const fn new(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }
    pub fn from_clone(state: T) -> Self where T: Clone {
        Self {
            x: state.clone(),
            y: state.clone(),
            z: state,
        }
    }
    pub fn iter(&self) -> impl Iterator<Item=&T> {
        once(&self.x).chain(once(&self.y)).chain(once(&self.z))
    }
    pub fn match_id(&self, id: XYZId) -> &T {
        match id {
            XYZId::X => &self.x,
            XYZId::Y => &self.y,
            XYZId::Z => &self.z,
        }
    }
    pub fn match_id_mut(&mut self, id: XYZId) -> &mut T {
        match id {
            XYZId::X => &mut self.x,
            XYZId::Y => &mut self.y,
            XYZId::Z => &mut self.z,
        }
    }

    pub fn map<TR>(&self, p: impl Fn(&T) -> TR) -> XYZData<TR> {
        XYZData { x: p(&self.x), y: p(&self.y), z: p(&self.z) }
    }

    pub fn zip_map<U, TR>(&self, other: &XYZData<U>, p: impl Fn(&T, &U) -> TR) -> XYZData<TR> {
        XYZData { x: p(&self.x, &other.x), y: p(&self.y, &other.y), z: p(&self.z, &other.z) }
    }
}
