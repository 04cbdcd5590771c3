use std::f64::consts::PI;




/// Number of Simpson panels used to evaluate the wake time coordinate
const TIME_QUADRATURE_PANELS: usize = 256;

/// Distance from the planet's orbit, in code units, inside which the wake
/// coordinate transforms are singular and all perturbations vanish
const COROTATION_GAP: f64 = 1e-12;




/**
 * Sense of the disk rotation, as seen from above
 */
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Rotation {
    Anticlockwise,
    Clockwise,
}

impl Rotation {
    pub fn sign(self) -> f64 {
        match self {
            Rotation::Anticlockwise => 1.0,
            Rotation::Clockwise => -1.0,
        }
    }
}




/**
 * Perturbations of the disk at one point: surface density relative to the
 * background, and the radial and azimuthal velocities. Velocities are in
 * units of the Keplerian speed at the planet unless stated otherwise.
 */
#[derive(Clone, Copy, Debug, Default, PartialEq, derive_more::Add, derive_more::Mul)]
pub struct Perturbation {
    pub density: f64,
    pub v_r: f64,
    pub v_phi: f64,
}




/**
 * A locally isothermal disk with power-law sound speed and surface density
 * profiles, and the wake coordinate system of a planet on a circular orbit
 * inside it. All lengths are in units of the planet's orbital radius.
 */
#[derive(Clone, Debug)]
pub struct PowerLawDisk {

    /// Aspect ratio at the planet
    pub hr: f64,

    /// Sound speed index, c ~ r^-q
    pub q: f64,

    /// Surface density index, Sigma ~ r^-p
    pub p: f64,

    /// Adiabatic index
    pub gamma: f64,

    pub rotation: Rotation,

    /// Azimuth of the planet
    pub phi_planet: f64,
}




// ============================================================================
impl PowerLawDisk {

    pub fn sound_speed(&self, r: f64) -> f64 {
        self.hr * r.powf(-self.q)
    }

    pub fn surface_density(&self, r: f64) -> f64 {
        r.powf(-self.p)
    }

    pub fn angular_frequency(&self, r: f64) -> f64 {
        r.powf(-1.5)
    }

    /**
     * Azimuth of the wake crest at radius r, from the WKB dispersion relation
     * of density waves launched at the planet.
     */
    pub fn phi_wake(&self, r: f64) -> f64 {
        let q = self.q;
        let shape = r.powf(q - 0.5) / (q - 0.5) - r.powf(q + 1.0) / (q + 1.0) - 3.0 / ((2.0 * q - 1.0) * (q + 1.0));
        self.phi_planet + self.rotation.sign() * side(r) * shape / self.hr
    }

    /**
     * Azimuthal wake coordinate: the distance from the wake crest, scaled by
     * the wake length 2/3 H_p.
     */
    pub fn eta(&self, r: f64, phi: f64) -> f64 {
        self.eta_scale() * wrap_angle(phi - self.phi_wake(r))
    }

    /**
     * Number of eta units per radian of azimuth.
     */
    pub fn eta_scale(&self) -> f64 {
        1.5 / self.hr
    }

    /**
     * Radial wake coordinate, which plays the role of time in the Burgers
     * equation governing the wake amplitude. Zero at the planet's orbit and
     * increasing monotonically away from it on both sides.
     */
    pub fn time(&self, r: f64) -> f64 {
        let exponent = 0.5 * (5.0 * self.q + self.p) - 2.75;
        let integrand = |s: f64| (s.powf(1.5) - 1.0).abs().powf(1.5) * s.powf(exponent);
        let coefficient = 3.0 * self.hr.powf(-2.5) / 2f64.powf(1.25);
        coefficient * simpson(integrand, 1.0, r, TIME_QUADRATURE_PANELS).abs()
    }

    pub fn g(&self, r: f64) -> f64 {
        2f64.powf(0.25) * self.hr.sqrt() * r.powf(0.5 * (1.0 - self.p - 3.0 * self.q)) / (r.powf(1.5) - 1.0).abs().sqrt()
    }

    pub fn lambda_u(&self, r: f64) -> f64 {
        let shear = (r.powf(-1.5) - 1.0).abs();
        2f64.powf(0.75) * self.hr.sqrt() / (self.gamma + 1.0) * shear.sqrt() * r.powf(0.5 * (self.p + self.q - 1.0))
    }

    pub fn lambda_v(&self, r: f64) -> f64 {
        let shear = (r.powf(-1.5) - 1.0).abs();
        2f64.powf(0.75) * self.hr.powf(1.5) / (self.gamma + 1.0) / shear.sqrt() * r.powf(0.5 * (self.p - self.q - 3.0))
    }

    /**
     * Scaled wake amplitude chi corresponding to a relative density
     * perturbation at radius r.
     */
    pub fn chi_from_density(&self, r: f64, density: f64) -> f64 {
        if (r - 1.0).abs() < COROTATION_GAP {
            return 0.0
        }
        0.5 * (self.gamma + 1.0) * self.g(r) * density
    }

    /**
     * Density and velocity perturbations corresponding to a wake amplitude
     * chi at radius r.
     */
    pub fn perturbation_from_chi(&self, r: f64, chi: f64) -> Perturbation {
        if (r - 1.0).abs() < COROTATION_GAP {
            return Perturbation::default()
        }
        Perturbation {
            density: 2.0 * chi / ((self.gamma + 1.0) * self.g(r)),
            v_r: side(r) * self.lambda_u(r) * chi,
            v_phi: self.rotation.sign() * side(r) * self.lambda_v(r) * chi,
        }
    }
}




// ============================================================================
pub fn side(r: f64) -> f64 {
    if r < 1.0 { -1.0 } else { 1.0 }
}

/**
 * Map an angle into [-pi, pi).
 */
pub fn wrap_angle(angle: f64) -> f64 {
    (angle + PI).rem_euclid(2.0 * PI) - PI
}

/**
 * Composite Simpson's rule with an even number of panels. The interval may
 * be reversed, in which case the result changes sign.
 */
pub fn simpson<F: Fn(f64) -> f64>(f: F, a: f64, b: f64, panels: usize) -> f64 {
    let n = panels + panels % 2;
    let h = (b - a) / n as f64;
    let interior: f64 = (1..n)
        .map(|i| f(a + i as f64 * h) * if i % 2 == 1 { 4.0 } else { 2.0 })
        .sum();
    (f(a) + interior + f(b)) * h / 3.0
}




// ============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn disk() -> PowerLawDisk {
        PowerLawDisk {
            hr: 0.1,
            q: 0.25,
            p: 1.0,
            gamma: 1.0,
            rotation: Rotation::Anticlockwise,
            phi_planet: 0.0,
        }
    }

    #[test]
    fn simpson_integrates_cubics_exactly() {
        assert_relative_eq!(simpson(|x| x * x * x, 0.0, 2.0, 4), 4.0, max_relative = 1e-12);
        assert_relative_eq!(simpson(|x| x * x, 2.0, 0.0, 8), -8.0 / 3.0, max_relative = 1e-12);
    }

    #[test]
    fn wrap_angle_maps_into_half_open_interval() {
        assert_relative_eq!(wrap_angle(3.0 * PI / 2.0), -PI / 2.0, epsilon = 1e-12);
        assert_relative_eq!(wrap_angle(-PI), -PI, epsilon = 1e-12);
        assert_relative_eq!(wrap_angle(PI), -PI, epsilon = 1e-12);
        assert_relative_eq!(wrap_angle(0.25), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn wake_starts_at_the_planet_and_trails_outside_its_orbit() {
        let disk = disk();
        assert_relative_eq!(disk.phi_wake(1.0), 0.0, epsilon = 1e-12);
        assert!(disk.phi_wake(1.5) < 0.0);
        assert!(disk.phi_wake(0.7) > 0.0);

        let mirrored = PowerLawDisk { rotation: Rotation::Clockwise, ..disk.clone() };
        assert_relative_eq!(mirrored.phi_wake(1.5), -disk.phi_wake(1.5), epsilon = 1e-12);
    }

    #[test]
    fn wake_time_grows_away_from_the_planet() {
        let disk = disk();
        assert_relative_eq!(disk.time(1.0), 0.0, epsilon = 1e-12);
        assert!(disk.time(1.2) > 0.0);
        assert!(disk.time(1.4) > disk.time(1.2));
        assert!(disk.time(0.6) > disk.time(0.8));
    }

    #[test]
    fn density_and_chi_conversions_are_inverse() {
        let disk = PowerLawDisk { gamma: 1.4, ..disk() };
        for &r in &[0.5, 0.9, 1.1, 2.0] {
            let chi = disk.chi_from_density(r, 0.3);
            assert_relative_eq!(disk.perturbation_from_chi(r, chi).density, 0.3, max_relative = 1e-12);
        }
    }

    #[test]
    fn perturbations_vanish_on_the_planet_orbit() {
        let disk = disk();
        assert_eq!(disk.chi_from_density(1.0, 1.0), 0.0);
        assert_eq!(disk.perturbation_from_chi(1.0, 1.0), Perturbation::default());
    }

    #[test]
    fn radial_velocity_changes_sign_across_the_orbit() {
        let disk = disk();
        assert!(disk.perturbation_from_chi(1.2, 1.0).v_r > 0.0);
        assert!(disk.perturbation_from_chi(0.8, 1.0).v_r < 0.0);
    }
}
