use cwise::{Array, Backend, Error, KernelRegistry, array, invoke, invoke_default};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_integer_floor_not_truncation() {
    init_logging();
    let reg = KernelRegistry::with_builtin_kernels();

    let out = invoke(
        &reg,
        "floor_div",
        Backend::Cpu,
        &array!([7i32]),
        &array!([2i32]),
    )
    .unwrap();
    assert_eq!(out.as_slice::<i32>().unwrap(), &[3]);

    let out = invoke(
        &reg,
        "floor_div",
        Backend::Cpu,
        &array!([-7i32]),
        &array!([2i32]),
    )
    .unwrap();
    assert_eq!(out.as_slice::<i32>().unwrap(), &[-4]);
}

#[test]
fn test_integer_floor_all_sign_combinations() {
    let reg = KernelRegistry::with_builtin_kernels();
    let lhs = array!([7i64, -7, 7, -7, 6, -6]);
    let rhs = array!([2i64, 2, -2, -2, 3, 3]);
    let out = invoke(&reg, "floor_div", Backend::Cpu, &lhs, &rhs).unwrap();
    assert_eq!(out.as_slice::<i64>().unwrap(), &[3, -4, -4, 3, 2, -2]);
}

#[test]
fn test_integer_division_by_zero_aborts_call() {
    let reg = KernelRegistry::with_builtin_kernels();
    let err = invoke(
        &reg,
        "floor_div",
        Backend::Cpu,
        &array!([5i32]),
        &array!([0i32]),
    );
    assert!(matches!(err, Err(Error::DivisionByZero)));

    // One zero anywhere in the divisor fails the whole call.
    let err = invoke(
        &reg,
        "floor_div",
        Backend::Cpu,
        &array!([1u16, 2, 3]),
        &array!([1u16, 0, 1]),
    );
    assert!(matches!(err, Err(Error::DivisionByZero)));
}

#[test]
fn test_real_division_by_zero_yields_infinity() {
    let reg = KernelRegistry::with_builtin_kernels();
    let out = invoke(
        &reg,
        "floor_div_real",
        Backend::Cpu,
        &array!([5.0f64]),
        &array!([0.0f64]),
    )
    .unwrap();
    assert_eq!(out.as_slice::<f64>().unwrap(), &[f64::INFINITY]);
}

#[test]
fn test_real_special_values_propagate() {
    let reg = KernelRegistry::with_builtin_kernels();
    let lhs = Array::from_vec(vec![3], vec![f32::INFINITY, f32::NAN, -1.0]).unwrap();
    let rhs = Array::from_vec(vec![3], vec![2.0f32, 2.0, 0.0]).unwrap();
    let out = invoke(&reg, "floor_div_real", Backend::Cpu, &lhs, &rhs).unwrap();
    let o = out.as_slice::<f32>().unwrap();
    assert_eq!(o[0], f32::INFINITY);
    assert!(o[1].is_nan());
    assert_eq!(o[2], f32::NEG_INFINITY);
}

#[test]
fn test_real_floor_semantics() {
    let reg = KernelRegistry::with_builtin_kernels();
    let out = invoke(
        &reg,
        "floor_div_real",
        Backend::Cpu,
        &array!([7.5f32, -7.5, 1.0]),
        &array!([2.0f32, 2.0, 3.0]),
    )
    .unwrap();
    assert_eq!(out.as_slice::<f32>().unwrap(), &[3.0, -4.0, 0.0]);
}

#[test]
fn test_half_precision_matches_f32_promotion() {
    let reg = KernelRegistry::with_builtin_kernels();
    let to = half::f16::from_f32;
    let lhs = Array::from_vec(vec![3], vec![to(7.0), to(-7.0), to(5.0)]).unwrap();
    let rhs = Array::from_vec(vec![3], vec![to(2.0), to(2.0), to(0.0)]).unwrap();
    let out = invoke(&reg, "floor_div_real", Backend::Cpu, &lhs, &rhs).unwrap();
    let o = out.as_slice::<half::f16>().unwrap();
    assert_eq!(o[0], to(3.0));
    assert_eq!(o[1], to(-4.0));
    assert_eq!(o[2], half::f16::INFINITY);
}

#[test]
fn test_unsigned_floor_div() {
    let reg = KernelRegistry::with_builtin_kernels();
    let out = invoke(
        &reg,
        "floor_div",
        Backend::Cpu,
        &array!([255u8, 9]),
        &array!([4u8, 3]),
    )
    .unwrap();
    assert_eq!(out.as_slice::<u8>().unwrap(), &[63, 3]);
}

#[test]
fn test_invoke_default_uses_cpu_by_default() {
    let reg = KernelRegistry::with_builtin_kernels();
    let out = invoke_default(&reg, "floor_div", &array!([9i32]), &array!([2i32])).unwrap();
    assert_eq!(out.as_slice::<i32>().unwrap(), &[4]);
}

#[test]
fn test_multidimensional_arrays() {
    let reg = KernelRegistry::with_builtin_kernels();
    let lhs = array!([[7i32, -7], [9, -9]]);
    let rhs = array!([[2i32, 2], [4, 4]]);
    let out = invoke(&reg, "floor_div", Backend::Cpu, &lhs, &rhs).unwrap();
    assert_eq!(out.shape(), &[2, 2]);
    assert_eq!(out.as_slice::<i32>().unwrap(), &[3, -4, 2, -3]);
}
