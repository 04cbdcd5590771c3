use crate::disks::Perturbation;




/**
 * Anything that can report the linear wake solution at a point of the disk.
 * Positions are in code units (lengths in units of the planet's orbital
 * radius) and the returned perturbation is in code units too. A source
 * returns `None` where it has no data.
 */
pub trait LinearFieldSource: Sync {
    fn sample(&self, r: f64, phi: f64) -> Option<Perturbation>;

    fn name(&self) -> &str;
}
