use dimsquery::{
    AsyncSpectrumProvider,
    DataProcessingError,
    DimsqueryError,
    InMemorySpectra,
    IonMode,
    PrecursorWindow,
    RawSpectrum,
    SpectrumPeak,
    SpectrumProvider,
    TupleRange,
};

fn sample_spectra() -> Vec<RawSpectrum> {
    vec![
        RawSpectrum::new(10, 1, IonMode::Positive, vec![SpectrumPeak::new(100.0, 5.0)])
            .with_scan_start_time(0.1),
        RawSpectrum::new(11, 2, IonMode::Positive, vec![SpectrumPeak::new(60.0, 1.0)])
            .with_scan_start_time(0.15)
            .with_precursor(PrecursorWindow {
                isolation_target_mz: 100.0,
                isolation_lower_offset: 0.5,
                isolation_upper_offset: 0.5,
                collision_energy: 20.0,
            }),
        RawSpectrum::new(12, 1, IonMode::Positive, vec![SpectrumPeak::new(100.0, 7.0)])
            .with_scan_start_time(0.2),
    ]
}

#[test]
fn test_sync_queries() {
    let provider = InMemorySpectra::new(sample_spectra());
    assert_eq!(provider.load_ms1_spectra().unwrap().len(), 2);
    assert_eq!(provider.load_msn_spectra(2).unwrap().len(), 1);
    assert_eq!(provider.load_spectrum(11).unwrap().ms_level, 2);

    let range = TupleRange::try_new(0.12, 0.2).unwrap();
    let in_range = provider.load_spectra_in_time_range(range).unwrap();
    let indices: Vec<usize> = in_range.iter().map(|s| s.index).collect();
    assert_eq!(indices, vec![11, 12]);
}

#[test]
fn test_async_queries_match_sync() {
    let provider = InMemorySpectra::new(sample_spectra());
    let all = futures::executor::block_on(provider.load_all_spectra_async()).unwrap();
    assert_eq!(all, provider.load_all_spectra().unwrap());
    let ms1 = futures::executor::block_on(provider.load_ms1_spectra_async()).unwrap();
    assert_eq!(ms1.len(), 2);
    let missing = futures::executor::block_on(provider.load_spectrum_async(99));
    assert!(missing.is_err());
}

#[test]
fn test_json_file_round_trip() {
    let dir = std::env::temp_dir().join("dimsquery_provider_json");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("spectra.json");
    std::fs::write(&path, serde_json::to_string(&sample_spectra()).unwrap()).unwrap();

    let provider = InMemorySpectra::from_file(&path).unwrap();
    assert_eq!(provider.len(), 3);
    assert_eq!(provider.load_spectrum(12).unwrap().peaks[0].intensity, 7.0);

    let missing = InMemorySpectra::from_file(&dir.join("does_not_exist.json"));
    assert!(missing.is_err());
}

#[test]
fn test_json_file_with_negative_mz_is_rejected() {
    let dir = std::env::temp_dir().join("dimsquery_provider_negative_mz");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("spectra.json");
    let bad = vec![RawSpectrum::new(
        3,
        1,
        IonMode::Positive,
        vec![SpectrumPeak::new(-100.0, 5.0)],
    )];
    std::fs::write(&path, serde_json::to_string(&bad).unwrap()).unwrap();

    match InMemorySpectra::from_file(&path) {
        Err(DimsqueryError::DataProcessingError(DataProcessingError::ExpectedFiniteData {
            spectrum_index,
            mz,
            ..
        })) => {
            assert_eq!(spectrum_index, 3);
            assert_eq!(mz, -100.0);
        }
        other => panic!("Expected a data processing error, got {:?}", other),
    }
}
