// Subspace scalar operations: key table binding, typed get/set, raw access,
// modified markers and governance updates.

mod common;

use std::time::Duration;

use common::*;
use ledger_params::{encode_value, JsonCodec, ParamsError};
use ledger_store::{BlockHeader, Context};

#[test]
fn test_key_table_attached() {
    let (_, ss) = setup();
    assert!(ss.has_key_table());
    assert_eq!(ss.key_table().map(|t| t.len()), Some(3));
    assert!(!bare_subspace("fresh").has_key_table());
}

#[test]
#[should_panic(expected = "Key table already set for subspace testsubspace")]
fn test_second_key_table_panics() {
    let (_, ss) = setup();
    ss.with_key_table(param_key_table());
}

#[test]
fn test_key_tables_on_distinct_instances() {
    let a = bare_subspace("testsubspace2").with_key_table(param_key_table());
    let b = bare_subspace("testsubspace2").with_key_table(param_key_table());
    assert!(a.has_key_table());
    assert!(b.has_key_table());
}

#[test]
fn test_attach_from_table() {
    let ss = param_key_table().attach(bare_subspace("attached"));
    assert!(ss.has_key_table());
    assert_eq!(ss.name(), "attached");
}

#[test]
fn test_name() {
    let (_, ss) = setup();
    assert_eq!(ss.name(), "testsubspace");
}

#[test]
#[should_panic(expected = "has no stored value")]
fn test_get_missing_value_panics() {
    let (mut store, ss) = setup();
    let ctx = Context::new(&mut store, BlockHeader::default());
    let _: Duration = ss.get(&ctx, KEY_UNBONDING_TIME);
}

#[test_log::test]
fn test_get_set() {
    let (mut store, ss) = setup();
    let mut ctx = Context::new(&mut store, BlockHeader::default());

    ss.set(&mut ctx, KEY_UNBONDING_TIME, &hours(48));
    let v: Duration = ss.get(&ctx, KEY_UNBONDING_TIME);
    assert_eq!(v, hours(48));

    ss.set(&mut ctx, KEY_MAX_VALIDATORS, &150u16);
    ss.set(&mut ctx, KEY_BOND_DENOM, &"ulp".to_string());
    assert_eq!(ss.get::<u16>(&ctx, KEY_MAX_VALIDATORS), 150);
    assert_eq!(ss.get::<String>(&ctx, KEY_BOND_DENOM), "ulp");
}

#[test]
fn test_get_if_exists() {
    let (mut store, ss) = setup();
    let mut ctx = Context::new(&mut store, BlockHeader::default());

    let mut v = Duration::ZERO;
    ss.get_if_exists(&ctx, KEY_UNBONDING_TIME, &mut v);
    assert_eq!(v, Duration::ZERO);

    let mut preset = hours(72);
    ss.get_if_exists(&ctx, KEY_UNBONDING_TIME, &mut preset);
    assert_eq!(preset, hours(72));

    ss.set(&mut ctx, KEY_UNBONDING_TIME, &hours(48));
    ss.get_if_exists(&ctx, KEY_UNBONDING_TIME, &mut preset);
    assert_eq!(preset, hours(48));
}

#[test]
fn test_get_raw() {
    let (mut store, ss) = setup();
    let mut ctx = Context::new(&mut store, BlockHeader::default());
    assert_eq!(ss.get_raw(&ctx, KEY_UNBONDING_TIME), None);

    ss.set(&mut ctx, KEY_UNBONDING_TIME, &hours(48));
    let raw = ss.get_raw(&ctx, KEY_UNBONDING_TIME).unwrap();
    assert_eq!(hex::encode_upper(&raw), "2231373238303030303030303030303022");
    assert_eq!(ss.get::<Duration>(&ctx, KEY_UNBONDING_TIME), hours(48));
}

#[test]
fn test_physical_layout() {
    let (mut store, ss) = setup();
    let (key, tkey) = store_keys();
    {
        let mut ctx = Context::new(&mut store, BlockHeader::default());
        ss.set(&mut ctx, KEY_BOND_DENOM, &"stake".to_string());
    }
    let committed = store.store(&key).unwrap();
    assert_eq!(
        committed.iter().collect::<Vec<_>>(),
        vec![(b"testsubspace/BondDenom".as_slice(), b"\"stake\"".as_slice())]
    );
    assert_eq!(store.store(&tkey).unwrap().len(), 1);
}

#[test]
fn test_has() {
    let (mut store, ss) = setup();
    let mut ctx = Context::new(&mut store, BlockHeader::default());

    assert!(!ss.has(&ctx, KEY_UNBONDING_TIME));
    ss.set(&mut ctx, KEY_UNBONDING_TIME, &hours(48));
    assert!(ss.has(&ctx, KEY_UNBONDING_TIME));
}

#[test]
fn test_modified() {
    let (mut store, ss) = setup();
    {
        let mut ctx = Context::new(&mut store, BlockHeader::default());
        assert!(!ss.modified(&ctx, KEY_UNBONDING_TIME));
        ss.set(&mut ctx, KEY_UNBONDING_TIME, &hours(48));
        assert!(ss.modified(&ctx, KEY_UNBONDING_TIME));
        assert!(!ss.modified(&ctx, KEY_MAX_VALIDATORS));
    }

    store.commit();
    let ctx = Context::new(&mut store, BlockHeader::new("ledger-test", 2));
    assert!(!ss.modified(&ctx, KEY_UNBONDING_TIME));
    assert!(ss.has(&ctx, KEY_UNBONDING_TIME));
}

#[test]
fn test_modified_is_value_independent() {
    let (mut store, ss) = setup();
    {
        let mut ctx = Context::new(&mut store, BlockHeader::default());
        ss.set(&mut ctx, KEY_MAX_VALIDATORS, &100u16);
    }
    store.commit();

    let mut ctx = Context::new(&mut store, BlockHeader::default());
    ss.set(&mut ctx, KEY_MAX_VALIDATORS, &100u16);
    assert!(ss.modified(&ctx, KEY_MAX_VALIDATORS));
}

#[test]
#[should_panic(expected = "not registered in subspace testsubspace")]
fn test_set_unknown_key_panics() {
    let (mut store, ss) = setup();
    let mut ctx = Context::new(&mut store, BlockHeader::default());
    ss.set(&mut ctx, b"invalidkey", &1u16);
}

#[test]
#[should_panic(expected = "registered duration, accessed as uint64")]
fn test_set_wrong_type_panics() {
    let (mut store, ss) = setup();
    let mut ctx = Context::new(&mut store, BlockHeader::default());
    ss.set(&mut ctx, KEY_UNBONDING_TIME, &172_800u64);
}

#[test]
#[should_panic(expected = "registered uint16, accessed as string")]
fn test_get_wrong_type_panics() {
    let (mut store, ss) = setup();
    let mut ctx = Context::new(&mut store, BlockHeader::default());
    ss.set(&mut ctx, KEY_MAX_VALIDATORS, &100u16);
    let _: String = ss.get(&ctx, KEY_MAX_VALIDATORS);
}

#[test]
#[should_panic(expected = "unbonding time must be at least one day")]
fn test_set_invalid_value_panics() {
    let (mut store, ss) = setup();
    let mut ctx = Context::new(&mut store, BlockHeader::default());
    ss.set(&mut ctx, KEY_UNBONDING_TIME, &hours(1));
}

#[test]
#[should_panic(expected = "not registered in subspace testsubspace")]
fn test_update_unknown_key_panics() {
    let (mut store, ss) = setup();
    let mut ctx = Context::new(&mut store, BlockHeader::default());
    let _ = ss.update(&mut ctx, b"invalidkey", b"");
}

#[test_log::test]
fn test_update() {
    let (mut store, ss) = setup();
    let mut ctx = Context::new(&mut store, BlockHeader::default());
    ss.set(&mut ctx, KEY_UNBONDING_TIME, &hours(48));

    let bad = encode_value(&JsonCodec, &Duration::from_secs(5 * 60)).unwrap();
    let err = ss.update(&mut ctx, KEY_UNBONDING_TIME, &bad).unwrap_err();
    assert!(matches!(err, ParamsError::UpdateRejected { .. }));
    assert!(err.is_recoverable());
    assert_eq!(ss.get::<Duration>(&ctx, KEY_UNBONDING_TIME), hours(48));

    let good = encode_value(&JsonCodec, &hours(360)).unwrap();
    ss.update(&mut ctx, KEY_UNBONDING_TIME, &good).unwrap();
    assert_eq!(ss.get::<Duration>(&ctx, KEY_UNBONDING_TIME), hours(360));
}

#[test]
fn test_update_rejects_wrong_shape() {
    let (mut store, ss) = setup();
    let mut ctx = Context::new(&mut store, BlockHeader::default());
    ss.set(&mut ctx, KEY_MAX_VALIDATORS, &100u16);

    for encoded in [&b"\"100\""[..], b"70000", b"{", b"-1"] {
        let err = ss.update(&mut ctx, KEY_MAX_VALIDATORS, encoded).unwrap_err();
        assert!(matches!(err, ParamsError::UpdateDecode { .. }), "{:?}", err);
    }
    assert_eq!(ss.get::<u16>(&ctx, KEY_MAX_VALIDATORS), 100);
}

#[test]
fn test_rejected_update_leaves_marker_untouched() {
    let (mut store, ss) = setup();
    {
        let mut ctx = Context::new(&mut store, BlockHeader::default());
        ss.set(&mut ctx, KEY_BOND_DENOM, &"stake".to_string());
    }
    store.commit();

    let mut ctx = Context::new(&mut store, BlockHeader::default());
    assert!(ss.update(&mut ctx, KEY_BOND_DENOM, b"\"\"").is_err());
    assert!(!ss.modified(&ctx, KEY_BOND_DENOM));

    ss.update(&mut ctx, KEY_BOND_DENOM, b"\"ulp\"").unwrap();
    assert!(ss.modified(&ctx, KEY_BOND_DENOM));
    assert_eq!(ss.get_raw(&ctx, KEY_BOND_DENOM), Some(b"\"ulp\"".to_vec()));
}

#[test]
fn test_update_inside_rolled_back_transition() {
    let (mut store, ss) = setup();
    let mut ctx = Context::new(&mut store, BlockHeader::default());
    ss.set(&mut ctx, KEY_MAX_VALIDATORS, &100u16);

    let res: Result<(), ParamsError> = ctx.run_atomic(|branch| {
        ss.update(branch, KEY_MAX_VALIDATORS, b"125")?;
        assert_eq!(ss.get::<u16>(branch, KEY_MAX_VALIDATORS), 125);
        ss.update(branch, KEY_BOND_DENOM, b"\"\"")
    });

    assert!(res.is_err());
    assert_eq!(ss.get::<u16>(&ctx, KEY_MAX_VALIDATORS), 100);
}

#[test]
fn test_subspaces_share_store_without_collision() {
    let (mut store, staking) = setup();
    let slashing = bare_subspace("slashing").with_key_table(param_key_table());
    let mut ctx = Context::new(&mut store, BlockHeader::default());

    staking.set(&mut ctx, KEY_MAX_VALIDATORS, &100u16);
    assert!(!slashing.has(&ctx, KEY_MAX_VALIDATORS));
    assert!(!slashing.modified(&ctx, KEY_MAX_VALIDATORS));

    slashing.set(&mut ctx, KEY_MAX_VALIDATORS, &7u16);
    assert_eq!(staking.get::<u16>(&ctx, KEY_MAX_VALIDATORS), 100);
    assert_eq!(slashing.get::<u16>(&ctx, KEY_MAX_VALIDATORS), 7);
}

#[test]
fn test_read_only_view() {
    let (mut store, ss) = setup();
    let ro = ss.read_only();
    let mut ctx = Context::new(&mut store, BlockHeader::default());

    assert_eq!(ro.name(), "testsubspace");
    assert!(!ro.has(&ctx, KEY_BOND_DENOM));

    ss.set(&mut ctx, KEY_BOND_DENOM, &"stake".to_string());
    assert!(ro.has(&ctx, KEY_BOND_DENOM));
    assert!(ro.modified(&ctx, KEY_BOND_DENOM));
    assert_eq!(ro.get::<String>(&ctx, KEY_BOND_DENOM), "stake");
    assert_eq!(ro.get_raw(&ctx, KEY_BOND_DENOM), Some(b"\"stake\"".to_vec()));

    let mut denom = String::from("unset");
    ro.get_if_exists(&ctx, KEY_BOND_DENOM, &mut denom);
    assert_eq!(denom, "stake");
}
