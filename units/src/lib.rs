pub mod todo;

pub use uom;

pub mod mmps {

  use uom::si::{
    length::millimeter,
    mass::kilogram,
    time::second,
    electric_current::ampere,
    thermodynamic_temperature::kelvin,
    amount_of_substance::mole,
    luminous_intensity::candela,
  };

  // TODO: replace with system! macro, once it has been fixed in uom
  #[allow(dead_code)]
  type Units = dyn uom::si::Units<
      f32,
    length                    = millimeter,
    mass                      = kilogram,
    time                      = second,
    electric_current          = ampere,
    thermodynamic_temperature = kelvin,
    amount_of_substance       = mole,
    luminous_intensity        = candela>;

  pub mod f32 {
    use uom::{ISQ, system};
    ISQ!(uom::si, f32, (millimeter, kilogram, second, ampere, kelvin, mole, candela));

    /// Half a turn (π).
    pub const HALF_TURN: Angle = Angle {
        dimension: std::marker::PhantomData,
        units: std::marker::PhantomData,
        value: std::f32::consts::PI,
    };
  }

}

pub use uom::si::Quantity;
pub use mmps::f32::{Angle, HALF_TURN, Length, Area, Ratio, Time};

mod units {
  pub use uom::si::{length::{micrometer, millimeter, centimeter},
                    area  ::square_millimeter,
                    ratio ::ratio,
                    angle ::{radian, degree, revolution},
                    time  ::second,
  };
}

// Making values from float literals seems to be very long-winded, so provide
// some pithily-named convenience constructors.

/// Generate a function called NAME which returns QUANTITY by interpreting its
/// argument as UNIT
///
/// wrap!(NAME QUANTITY UNIT);
macro_rules! wrap {
  ($name:ident $quantity:ident $unit:ident ) => {
    pub fn $name(x: f32) -> $quantity { $quantity::new::<units::$unit>(x) }
  };
}

wrap!(cm     Length        centimeter);
wrap!(mm     Length        millimeter);
wrap!(um     Length        micrometer);
wrap!(mm2    Area   square_millimeter);
wrap!(ratio  Ratio              ratio);
wrap!(radian Angle             radian);
wrap!(degree Angle             degree);
wrap!(turn   Angle         revolution);
wrap!(s      Time              second);

// Reverse direction of the above.
pub fn mm_ (x: Length) -> f32 { x.get::<units::millimeter>() }
pub fn mm2_(x: Area  ) -> f32 { x.get::<units::square_millimeter>() }

pub fn ratio_ (x: Ratio) -> f32 { x.get::<units::ratio>() }
pub fn radian_(x: Angle) -> f32 { x.get::<units::radian>() }
pub fn degree_(x: Angle) -> f32 { x.get::<units::degree>() }

pub fn s_(x: Time) -> f32 { x.get::<units::second>() }

#[macro_export]
macro_rules! in_base_unit {
  ($value:expr) => {
    $crate::Quantity {
      dimension: std::marker::PhantomData,
      units: std::marker::PhantomData,
      value: $value,
    }
  };
}

#[macro_export]
macro_rules! assert_uom_eq {
  ($unit:ident, $lhs:expr, $rhs:expr, $algo:ident <= $tol:expr) => {
    float_eq::assert_float_eq!($lhs.get::<$unit>(), $rhs.get::<$unit>(), $algo <= $tol)
  };
}
