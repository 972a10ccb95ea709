//! End-to-end driver scenarios: full push → advance → extract → convolve
//! cycles across the regimes, with hand-computed expected values.

use approx::assert_relative_eq;
use seep_conv::{
    FluxBuffer, FluxExtract, FracturesFluxContainer, KernelAccess, MainStepRing, SourceKernel,
    WellFlux,
};
use seep_conv::{FracFlux, FracKernel, MixStepWellKernel};
use nalgebra::{DMatrix, DVector};
use seep_core::ConvolveError;
use seep_window::{FluxAllocator, KernelAllocator};

// ── ConstStep kernel content ────────────────────────────────────

#[test]
fn const_step_kernel_commits_difference_slabs() {
    // Two mesh nodes, two segments, three slabs. Two steps of coefficients
    // with unit weights, extracting once per step.
    let mut kernel = SourceKernel::new(2, KernelAllocator::const_step(2, 3));

    for (row, col, e) in [(0, 0, 1.0), (0, 1, 2.0), (1, 0, 3.0), (1, 1, 4.0)] {
        kernel.push_coef(row, col, e, 1.0);
    }
    kernel.advance();
    kernel.advance_read_cursor();

    for (row, col, e) in [(0, 0, 2.0), (0, 1, 3.0), (1, 0, 4.0), (1, 1, 5.0)] {
        kernel.push_coef(row, col, e, 1.0);
    }
    kernel.advance();
    kernel.advance_read_cursor();

    // Live window covers both slabs: the raw first step and the
    // step-to-step differences.
    let expected = [[1.0, 3.0], [2.0, 4.0], [1.0, 1.0], [1.0, 1.0]];
    let view = kernel.live_view().unwrap();
    assert_eq!(view.ncols(), 4);
    for (col, col_values) in expected.iter().enumerate() {
        for (row, value) in col_values.iter().enumerate() {
            assert_relative_eq!(view[(row, col)], *value);
        }
    }

    assert_eq!(kernel.allocator().extractor.window(), 2);
    assert_eq!(kernel.allocator().extractor.idx_end(), 4);
}

// ── ConstStep flux saturation ───────────────────────────────────

#[test]
fn const_step_flux_forgets_oldest_past_the_boundary() {
    let mut flux = FluxBuffer::new(FluxAllocator::const_step(2, 3, 3));

    let slabs = [[1.0, 1.5], [2.0, 2.5], [3.0, 3.5], [4.0, 4.5]];
    let mut windows = Vec::new();
    for slab in &slabs {
        flux.push_slab(slab);
        flux.advance_read_cursor();
        let ext = &flux.allocator().extractor;
        windows.push((ext.idx_begin(), ext.idx_end()));
    }

    assert_eq!(windows[2], (0, 6));
    assert_eq!(windows[3], (0, 4));
}

// ── MainStep averaging ──────────────────────────────────────────

#[test]
fn main_step_averaging_interpolates_against_previous_sample() {
    // One segment, three sub-steps, four main steps. The second-period
    // time indices (nt > main_step_nmbr) read the averaged children at
    // their live fronts, which exposes the fan-out directly.
    let mut ring = MainStepRing::new(FluxAllocator::main_step(1, 4, 4, 3));

    ring.push_slab(&DVector::from_element(1, 9.0));
    ring.extract();
    // Against a zero previous sample: thirds of 9, raw sample last.
    assert_relative_eq!(ring.at(1, 0), 9.0);
    assert_relative_eq!(ring.at(5, 0), 3.0);
    assert_relative_eq!(ring.at(6, 0), 6.0);
    assert_relative_eq!(ring.at(7, 0), 9.0);

    ring.push_slab(&DVector::from_element(1, 3.0));
    ring.extract();
    // Against the previous raw sample of 9.
    assert_relative_eq!(ring.at(1, 0), 9.0);
    assert_relative_eq!(ring.at(2, 0), 3.0);
    assert_relative_eq!(ring.at(5, 0), 7.0);
    assert_relative_eq!(ring.at(6, 0), 5.0);
    assert_relative_eq!(ring.at(7, 0), 3.0);
}

// ── MixStep cursors ─────────────────────────────────────────────

#[test]
fn mix_step_extract_never_moves_the_cursors() {
    let mut kernel = MixStepWellKernel::new(2, KernelAllocator::mix_step(2, 4, 3, 8));

    for step in 0..6 {
        kernel
            .push_p_cur(DMatrix::from_element(2, 2, step as f64))
            .unwrap();
    }
    for _ in 0..6 {
        kernel.advance().unwrap();
        kernel.advance_read_cursor();
        let alloc = kernel.inner().allocator();
        assert_eq!(alloc.extractor.idx_begin(), 0);
        assert_eq!(alloc.extractor.idx_end(), 8);
    }
}

// ── Fracture round-robin gate ───────────────────────────────────

#[test]
fn fracture_convolve_gate_follows_the_push_cycle() {
    let children: Vec<FracFlux> = (0..3)
        .map(|_| FracFlux::new(FluxAllocator::const_step(2, 3, 3)))
        .collect();
    let mut container = FracturesFluxContainer::new(children);
    let mut kernels: Vec<FracKernel> = (0..3)
        .map(|_| {
            let mut kernel = FracKernel::new(2, KernelAllocator::const_step(2, 3));
            kernel.push_coef(&[1.0, 1.0], &[1.0; 4]);
            kernel.advance();
            kernel
        })
        .collect();

    // Three pushes close the cycle: convolve is allowed.
    for _ in 0..3 {
        container.push_coef(&[1.0, 1.0], 1.0);
    }
    assert_eq!(container.cur_frac_id(), 0);
    container.convolve(&mut kernels).unwrap();

    // A fourth push reopens the cycle; convolve needs three more.
    container.push_coef(&[1.0, 1.0], 1.0);
    assert!(matches!(
        container.convolve(&mut kernels),
        Err(ConvolveError::FractureCycleIncomplete { .. })
    ));
    container.push_coef(&[1.0, 1.0], 1.0);
    container.push_coef(&[1.0, 1.0], 1.0);
    container.convolve(&mut kernels).unwrap();
}

// ── Flag enforcement ────────────────────────────────────────────

#[test]
fn pending_kernel_reads_are_fatal_until_advance() {
    let mut kernel = SourceKernel::new(2, KernelAllocator::const_step(2, 3));
    kernel.push_coef(0, 0, 1.0, 1.0);

    assert!(matches!(
        kernel.live_view(),
        Err(ConvolveError::NeedAdvance { .. })
    ));

    kernel.advance();
    kernel.advance_read_cursor();
    assert!(kernel.live_view().is_ok());
}

// ── Algebraic property ──────────────────────────────────────────

#[test]
fn committed_coefficient_equals_weighted_difference() {
    // Seven slabs: one seeding advance plus one per (row, col) probe.
    let mut kernel = SourceKernel::new(3, KernelAllocator::const_step(2, 7));

    // Commit a first step to give P_prev known values.
    for row in 0..3 {
        for col in 0..2 {
            kernel.push_coef(row, col, (row + col) as f64, 1.0);
        }
    }
    kernel.advance();

    let f = 0.5;
    for row in 0..3 {
        for col in 0..2 {
            let p_prev_old = kernel.p_prev_at(row, col);
            let e = 10.0 + row as f64;
            kernel.push_coef(row, col, e, f);
            kernel.advance();

            // The freshly committed slab holds f * (E - P_prev_old).
            let t_new = kernel.allocator().pushed_data_counter() - 1;
            assert_relative_eq!(
                kernel.at_source(row, col, t_new).unwrap(),
                f * (e - p_prev_old)
            );
        }
    }
}

// ── ConstStep well pipeline ─────────────────────────────────────

#[test]
fn const_step_well_pipeline_convolves_history() {
    // One mesh node, one segment, three slabs. Influence steps 2, 5, 7
    // (slab differences 2, 3, 2); fluxes 4, 6, 8 over permeability 2.
    let mut kernel = SourceKernel::new(1, KernelAllocator::const_step(1, 3));
    let mut flux = WellFlux::new(FluxAllocator::const_step(1, 3, 3));

    let influence = [2.0, 5.0, 7.0];
    let qzi = [4.0, 6.0, 8.0];
    let expected = [4.0, 12.0, 21.0];

    for step in 0..3 {
        kernel.push_coef(0, 0, influence[step], 1.0);
        kernel.advance();
        flux.push_coef(&[qzi[step]], &[2.0]);

        let result = flux.extract().convolve(&mut kernel).unwrap();
        assert_eq!(result.len(), 1);
        assert_relative_eq!(result[0], expected[step]);
    }
}

// ── MainStep two-period pipeline ────────────────────────────────

#[test]
fn main_step_pipeline_crosses_into_the_second_period() {
    // One mesh node, one segment. Three main steps of dense history, then
    // four small steps of pre-averaged rotation (two per main step).
    let main_step_nmbr = 3;
    let small_step_nmbr = 2;
    let mut source = SourceKernel::new(
        1,
        KernelAllocator::main_step(1, 7, 2, small_step_nmbr, main_step_nmbr),
    );
    let mut ring = MainStepRing::new(FluxAllocator::main_step(
        1,
        main_step_nmbr,
        10,
        small_step_nmbr,
    ));

    let influence = [1.0, 3.0, 4.0, 6.0, 6.0, 7.0, 9.0];
    let samples = [6.0, 12.0, 4.0];
    let expected = [6.0, 24.0, 34.0, 31.0, 32.0, 26.0, 28.0];

    for step in 0..7 {
        source.push_coef(0, 0, influence[step], 1.0);
        source.advance();
        if step < main_step_nmbr {
            ring.push_slab(&DVector::from_element(1, samples[step]));
        }
        let result = ring.extract().convolve(&mut source).unwrap();
        assert_relative_eq!(result[0], expected[step]);
    }
}
