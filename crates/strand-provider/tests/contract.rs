//! Provider-side contract properties, exercised through the exported C-ABI
//! functions called as plain Rust functions.

use proptest::prelude::*;
use rstest::rstest;
use serial_test::serial;
use std::ffi::{c_void, CStr, CString};
use strand_provider::*;

// ============================================================================
// Scalars and structs
// ============================================================================

proptest! {
    #[test]
    fn add_matches_wrapping_semantics(a: u32, b: u32) {
        prop_assert_eq!(add_u32(a, b), a.wrapping_add(b));
        prop_assert_eq!(add_u32(a, b), add_u32(b, a));
    }

    #[test]
    fn swap_is_an_involution(x: u32, y: u32) {
        let pair = Pair { x, y };
        prop_assert_eq!(swap_pair(swap_pair(pair)), pair);
    }

    #[test]
    fn sum_even_matches_model(numbers in prop::collection::vec(any::<u32>(), 0..64)) {
        let expected = numbers
            .iter()
            .filter(|n| *n % 2 == 0)
            .fold(0u32, |acc, n| acc.wrapping_add(*n));
        prop_assert_eq!(unsafe { sum_even(numbers.as_ptr(), numbers.len()) }, expected);
    }

    #[test]
    fn count_chars_counts_scalars(text in "[^\u{0}]{0,40}") {
        let owned = CString::new(text.clone()).unwrap();
        prop_assert_eq!(unsafe { count_chars(owned.as_ptr()) }, text.chars().count() as u32);
    }
}

#[rstest]
#[case(&[1, 2, 3, 4, 5, 6], 12)]
#[case(&[], 0)]
#[case(&[1, 3, 5], 0)]
#[case(&[u32::MAX - 1, 2], 0)]
fn test_sum_even_cases(#[case] numbers: &[u32], #[case] expected: u32) {
    assert_eq!(unsafe { sum_even(numbers.as_ptr(), numbers.len()) }, expected);
}

#[test]
fn test_sum_even_null_array_counts_a_violation() {
    let before = strand_contract_violations();
    assert_eq!(unsafe { sum_even(std::ptr::null(), 3) }, 0);
    assert!(strand_contract_violations() > before);
}

#[test]
fn test_sum_even_null_empty_array_is_fine() {
    assert_eq!(unsafe { sum_even(std::ptr::null(), 0) }, 0);
}

#[test]
fn test_count_chars_is_not_byte_length() {
    let text = CString::new("göes to élevên").unwrap();
    assert_eq!(unsafe { count_chars(text.as_ptr()) }, 14);
    assert!(text.as_bytes().len() > 14);
}

// ============================================================================
// Owned buffers
// ============================================================================

#[test]
#[serial]
fn test_chant_alloc_free_cycles_leave_nothing_live() {
    for count in 0..=u8::MAX {
        let raw = chant_generate(count);
        assert!(!raw.is_null());
        let text = unsafe { CStr::from_ptr(raw) }.to_str().unwrap().to_owned();
        assert_eq!(text.matches("la ").count(), count as usize);
        unsafe { chant_free(raw) };
        assert!(!strand_is_live(raw as *const c_void));
    }
}

#[test]
#[serial]
fn test_primes_length_must_match() {
    let slice = primes_vec();
    let before = strand_contract_violations();

    unsafe { primes_free(slice.ptr, slice.len + 1) };
    assert!(strand_contract_violations() > before);
    assert!(strand_is_live(slice.ptr as *const c_void));

    unsafe { primes_free(slice.ptr, slice.len) };
    assert!(!strand_is_live(slice.ptr as *const c_void));
}

#[test]
fn test_fixed_triple_stable_across_calls() {
    let values: Vec<[i32; 3]> = (0..5).map(|_| unsafe { *fixed_triple() }).collect();
    assert!(values.iter().all(|v| *v == FIXED_TRIPLE));
}

// ============================================================================
// Opaque handle
// ============================================================================

#[test]
#[serial]
fn test_census_handle_released_once() {
    let census = census_new();
    assert!(strand_is_live(census as *const c_void));
    unsafe {
        census_populate(census);
        let zip = CString::new("90210").unwrap();
        let other = CString::new("20500").unwrap();
        let difference =
            census_population_of(census, zip.as_ptr()) - census_population_of(census, other.as_ptr());
        assert_eq!(difference, 90210 - 20500);
        census_free(census);
    }
    assert!(!strand_is_live(census as *const c_void));
}

#[test]
#[serial]
fn test_census_use_after_free_is_refused() {
    let census = census_new();
    unsafe {
        census_populate(census);
        census_free(census);

        let before = strand_contract_violations();
        census_populate(census);
        let zip = CString::new("90210").unwrap();
        assert_eq!(census_population_of(census, zip.as_ptr()), 0);
        assert!(strand_contract_violations() >= before + 2);
    }
}

#[test]
#[serial]
fn test_handle_passed_to_wrong_release() {
    let census = census_new();
    let before = strand_contract_violations();
    unsafe { chant_free(census as *mut std::ffi::c_char) };
    assert!(strand_contract_violations() > before);
    assert!(strand_is_live(census as *const c_void));
    unsafe { census_free(census) };
}
