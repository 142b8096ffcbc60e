// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Phase-detection paths: enablement at session start, PD parsing per
//! substage, the HW latch and PD data handed to the algorithm.

mod common;

use afstats_pipeline::*;
use afstats_structures::*;
use common::*;

fn pd_hw_script() -> PdScript {
    let script = PdScript::default();
    *script.hw_config.lock() = PdHwConfig {
        enable_pd_hw: true,
        ..Default::default()
    };
    script
}

fn pd_request(request_id: u64, stage: PipelineStage) -> ProcessRequest {
    let request = ProcessRequest::new(request_id, stage).with_pd_buffer(PdPort::RdiPdaf, vec![0u8; 64]);
    match stage {
        PipelineStage::BafStatsDependencyMet => request.with_baf_buffer(baf_buffer()),
        _ => request,
    }
}

#[test]
fn test_pd_hw_enabled_from_library_report() {
    let h = start_with(pdaf_init(test_config()), AlgorithmBehavior::default(), pd_hw_script()).unwrap();

    let state = h.processor.enablement_state();
    assert!(state.pdaf);
    assert!(state.sparse_pd_hw);
    assert!(state.pd_hw);
    assert!(!state.dual_pd_hw);
    assert!(!h.processor.settings().disable_pdaf);
    assert!(h.store.get(0, PropertyId::UsecasePdHwConfig).is_some());
}

#[test]
fn test_pd_hw_stays_off_when_library_declines() {
    let h = start_with(pdaf_init(test_config()), AlgorithmBehavior::default(), PdScript::default()).unwrap();

    let state = h.processor.enablement_state();
    assert!(state.pdaf);
    assert!(!state.pd_hw);
    assert!(h.store.get(0, PropertyId::UsecasePdHwConfig).is_none());
}

#[test]
fn test_missing_pd_library_disables_pdaf() {
    let mut config = test_config();
    config.algorithm.pd_library = "absent".to_string();
    let mut h = start_with(pdaf_init(config), AlgorithmBehavior::default(), PdScript::default()).unwrap();

    assert!(!h.processor.enablement_state().pdaf);
    assert!(h.processor.settings().disable_pdaf);

    // Without PDAF the early substage no longer needs a PD buffer.
    let path = h.processor.execute_process_request(&baf_request(5)).unwrap();
    assert_eq!(path, ExecutionPath::EarlySubstage);
}

#[test]
fn test_early_substage_parses_pd_before_algorithm() {
    let mut h = start_with(pdaf_init(test_config()), AlgorithmBehavior::default(), pd_hw_script()).unwrap();

    let path = h
        .processor
        .execute_process_request(&pd_request(5, PipelineStage::BafStatsDependencyMet))
        .unwrap();
    assert_eq!(path, ExecutionPath::EarlySubstage);

    assert_eq!(
        h.pd.processed.lock().as_slice(),
        &[(5, PdTrigger::Early, StartupMode::Valid)]
    );
    assert_eq!(h.store.get(5, PropertyId::BasePdInternal), Some(PropertyValue::Bool(true)));
    assert!(h.store.get(5, PropertyId::PdHwConfig).is_some());

    let log = h.log.lock();
    let pdaf = log
        .pushed
        .iter()
        .find_map(|p| match p {
            AfSetParam::PdafData(inputs) => Some(inputs.clone()),
            _ => None,
        })
        .expect("PDAF data pushed");
    assert_eq!(pdaf.early.trigger, PdTrigger::Early);
    assert_eq!(pdaf.early.defocus.defocus, vec![12]);
    assert_eq!(pdaf.normal.trigger, PdTrigger::Normal);
}

#[test]
fn test_missing_pd_buffer_aborts_request() {
    let mut h = start_with(pdaf_init(test_config()), AlgorithmBehavior::default(), pd_hw_script()).unwrap();

    let err = h.processor.execute_process_request(&baf_request(5)).unwrap_err();
    assert!(matches!(err, AfError::InvalidInput(_)));
    assert!(h.store.get(5, PropertyId::CrossAfStats).is_none());
    assert_eq!(h.log.lock().process_calls(), 0);
}

#[test]
fn test_pd_stage_publishes_marker_only_once() {
    let mut h = start_with(pdaf_init(test_config()), AlgorithmBehavior::default(), pd_hw_script()).unwrap();

    let path = h
        .processor
        .execute_process_request(&pd_request(6, PipelineStage::PdStatDependencyMet))
        .unwrap();
    assert_eq!(path, ExecutionPath::PdOnly);
    assert_eq!(h.store.write_count(6, PropertyId::AfBafDependencyMet), 1);
    assert!(h.store.get(6, PropertyId::AfPdFrameInfo).is_some());

    h.processor
        .execute_process_request(&pd_request(7, PipelineStage::BafStatsDependencyMet))
        .unwrap();
    h.processor
        .execute_process_request(&pd_request(7, PipelineStage::PdStatDependencyMet))
        .unwrap();
    assert_eq!(h.store.write_count(7, PropertyId::AfBafDependencyMet), 1);

    let processed = h.pd.processed.lock();
    assert_eq!(
        processed.iter().map(|(id, trigger, _)| (*id, *trigger)).collect::<Vec<_>>(),
        vec![(6, PdTrigger::Normal), (7, PdTrigger::Early), (7, PdTrigger::Normal)]
    );
    drop(processed);

    // One algorithm run for request 7 only; the PD stage never processes.
    assert_eq!(h.log.lock().process_calls(), 1);
}

#[test]
fn test_pd_hw_latch_violation_still_publishes_outputs() {
    let mut h = start_with(pdaf_init(test_config()), AlgorithmBehavior::default(), pd_hw_script()).unwrap();

    h.processor
        .execute_process_request(&pd_request(5, PipelineStage::BafStatsDependencyMet))
        .unwrap();

    h.pd.hw_config.lock().enable_pd_hw = false;
    let err = h
        .processor
        .execute_process_request(&pd_request(6, PipelineStage::BafStatsDependencyMet))
        .unwrap_err();
    assert!(matches!(err, AfError::HardwareConsistencyViolation(_)));

    assert_eq!(h.store.write_count(6, PropertyId::AfFrameControl), 1);
    assert!(h.store.get(6, PropertyId::PdHwConfig).is_none());
    assert!(h.store.get(6, PropertyId::AfBafDependencyMet).is_some());
    assert!(h.processor.enablement_state().pd_hw);
}

#[test]
fn test_type1_sensor_defers_pd_to_end_of_frame() {
    let mut init = pdaf_init(test_config());
    if let Some(sensor) = init.sensor.as_mut() {
        sensor.pd_sensor_type = PdSensorType::Type1;
    }
    let mut h = start_with(init, AlgorithmBehavior::default(), PdScript::default()).unwrap();

    h.processor
        .execute_process_request(&pd_request(5, PipelineStage::BafStatsDependencyMet))
        .unwrap();
    assert!(h.pd.processed.lock().is_empty());

    let unmet = h.processor.get_dependencies(&ProcessRequest::skipped(8)).unwrap();
    assert!(unmet.contains(&PropertySlot::new(PropertyId::AfPdFrameInfo, 1)));
}

#[test]
fn test_slave_camera_skips_pd_parsing() {
    let mut init = pdaf_init(test_config());
    init.camera = Some(CameraInfo {
        role: CameraRole::Slave,
        is_multi_camera: true,
        ..Default::default()
    });
    let mut h = start_with(init, AlgorithmBehavior::default(), pd_hw_script()).unwrap();

    h.processor
        .execute_process_request(&pd_request(5, PipelineStage::PdStatDependencyMet))
        .unwrap();
    assert!(h.pd.processed.lock().is_empty());
}

#[test]
fn test_skip_carries_pd_outputs_when_pdaf_enabled() {
    let mut h = start_with(pdaf_init(test_config()), AlgorithmBehavior::default(), pd_hw_script()).unwrap();

    h.processor
        .execute_process_request(&pd_request(4, PipelineStage::BafStatsDependencyMet))
        .unwrap();
    h.processor
        .execute_process_request(&pd_request(4, PipelineStage::PdStatDependencyMet))
        .unwrap();

    h.processor
        .execute_process_request(&ProcessRequest::skipped(5))
        .unwrap();
    assert!(h.store.get(5, PropertyId::PdHwConfig).is_some());
    assert!(h.store.get(5, PropertyId::AfPdFrameInfo).is_some());
}
