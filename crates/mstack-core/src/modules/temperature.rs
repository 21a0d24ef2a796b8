//! Electron temperature and T_e-based oxygen abundances.

use crate::common::ReddeningTable;
use crate::common::constants::{
    ELECTRON_DENSITY, O_DOUBLY_CONSTANT, O_DOUBLY_INV_T, O_DOUBLY_LINEAR_T, O_DOUBLY_LOG_T,
    O_SINGLY_CONSTANT, O_SINGLY_DENSITY, O_SINGLY_INV_T, O_SINGLY_LINEAR_T, O_SINGLY_LOG_T,
    OIII_DOUBLET_FACTOR, T2_OFFSET, T2_SLOPE, TEMP_A, TEMP_B, TEMP_C,
};
use crate::domain::{DerivedProperty, EmissionLine, StackError, StackResult};
use crate::numerics::combine;
use ndarray::{Array, Axis, Dimension, RemoveAxis, Zip};
use std::collections::BTreeMap;

pub type PropertyMap<D> = BTreeMap<DerivedProperty, Array<f64, D>>;

/// [OIII]4363 / [OIII]4959+5007 excitation ratio, reddening corrected when
/// `ebv` is given. Without `ebv` this is the observed ratio.
pub fn r_calculation<D: Dimension>(
    oiii_4363: &Array<f64, D>,
    oiii_5007: &Array<f64, D>,
    ebv: Option<&Array<f64, D>>,
    reddening: &ReddeningTable,
) -> StackResult<Array<f64, D>> {
    let observed = combine(oiii_4363, oiii_5007, |auroral, nebular| {
        auroral / (nebular * OIII_DOUBLET_FACTOR)
    })?;
    let Some(ebv) = ebv else {
        return Ok(observed);
    };

    let delta_k = reddening.k(EmissionLine::Oiii4363) - reddening.k(EmissionLine::Oiii5007);
    combine(&observed, ebv, |ratio, color_excess| {
        ratio * 10f64.powf(0.4 * color_excess * delta_k)
    })
}

/// T_e = a (-log10 R - b)^(-c), NaN wherever the base is not positive.
pub fn electron_temperature(r: f64) -> f64 {
    let base = -r.log10() - TEMP_B;
    if base > 0.0 {
        TEMP_A * base.powf(-TEMP_C)
    } else {
        f64::NAN
    }
}

pub fn temp_calculation<D: Dimension>(r: &Array<f64, D>) -> Array<f64, D> {
    r.mapv(electron_temperature)
}

/// O+/H and O++/H abundances for one object:
/// `[12+log(O/H), log(O+/H), log(O++/H), O+/H, O++/H]`.
fn oxygen_abundances(te: f64, two_beta: f64, three_beta: f64) -> [f64; 5] {
    let t3 = te * 1.0e-4;
    let t2 = T2_SLOPE * t3 + T2_OFFSET;
    let x2 = 1.0e-4 * ELECTRON_DENSITY * t2.powf(-0.5);

    let singly_log = two_beta.log10() + O_SINGLY_CONSTANT + O_SINGLY_INV_T / t2
        - O_SINGLY_LOG_T * t2.log10()
        - O_SINGLY_LINEAR_T * t2
        + (1.0 + O_SINGLY_DENSITY * x2).log10()
        - 12.0;
    let doubly_log = three_beta.log10() + O_DOUBLY_CONSTANT + O_DOUBLY_INV_T / t3
        - O_DOUBLY_LOG_T * t3.log10()
        - O_DOUBLY_LINEAR_T * t3
        - 12.0;

    let singly = 10f64.powf(singly_log);
    let doubly = 10f64.powf(doubly_log);
    let total_log = (singly + doubly).log10() + 12.0;

    [total_log, singly_log, doubly_log, singly, doubly]
}

/// Izotov et al. (2006) abundances from T_e, [OII]/Hb and [OIII]/Hb.
///
/// `det3` restricts the calculation to those object indices (rows along the
/// first axis); every other object is reported as NaN.
pub fn metallicity_calculation<D>(
    te: &Array<f64, D>,
    two_beta: &Array<f64, D>,
    three_beta: &Array<f64, D>,
    det3: Option<&[usize]>,
) -> StackResult<PropertyMap<D>>
where
    D: Dimension + RemoveAxis,
{
    if te.shape() != two_beta.shape() || te.shape() != three_beta.shape() {
        return Err(StackError::internal(
            "SYS.ARRAY_SHAPE",
            format!(
                "metallicity inputs must share a shape, got {:?}, {:?}, {:?}",
                te.shape(),
                two_beta.shape(),
                three_beta.shape()
            ),
        ));
    }

    let per_object = Zip::from(te)
        .and(two_beta)
        .and(three_beta)
        .map_collect(|t, o2, o3| oxygen_abundances(*t, *o2, *o3));

    let mut metals = PropertyMap::new();
    for (slot, property) in DerivedProperty::METALLICITY.into_iter().enumerate() {
        metals.insert(property, per_object.mapv(|values| values[slot]));
    }

    if let Some(selected) = det3 {
        let n_objects = te.len_of(Axis(0));
        if let Some(bad) = selected.iter().find(|index| **index >= n_objects) {
            return Err(StackError::input_validation(
                "INPUT.DETECTION_INDEX",
                format!(
                    "detection index {} is out of range for {} objects",
                    bad, n_objects
                ),
            ));
        }
        let mut keep = vec![false; n_objects];
        for index in selected {
            keep[*index] = true;
        }
        for values in metals.values_mut() {
            for (mut object, kept) in values.axis_iter_mut(Axis(0)).zip(keep.iter()) {
                if !kept {
                    object.fill(f64::NAN);
                }
            }
        }
    }

    Ok(metals)
}
