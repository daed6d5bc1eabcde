//! Offset-based port pair allocation with reclamation.

use std::collections::BTreeSet;
use std::sync::Arc;

use super::{PortProbe, gateway_port_for};
use crate::errors::{FleetError, FleetResult};
use crate::registry::Registry;
use crate::runtime::constants::ports::{
    BRIDGE_OFFSET, MAX_ALLOCATION_ATTEMPTS, MAX_EXPLICIT_PORT, MAX_PORT, MIN_EXPLICIT_PORT,
};
use crate::runtime::types::{Instance, PortPair};

/// Hands out gateway/bridge port pairs.
///
/// Works on the in-memory registry of the caller's locked cycle; the caller
/// persists the result together with the instance that uses it.
#[derive(Clone)]
pub struct PortAllocator {
    probe: Arc<dyn PortProbe>,
}

impl PortAllocator {
    pub fn new(probe: Arc<dyn PortProbe>) -> Self {
        Self { probe }
    }

    /// Pick the lowest usable offset and return its port pair.
    ///
    /// Reclaimed offsets are tried before the watermark advances. A candidate
    /// is skipped when its window overlaps a registered instance or either
    /// port fails the live probe; skipped candidates go back to the pool once
    /// the call ends.
    pub fn allocate(&self, registry: &mut Registry) -> FleetResult<PortPair> {
        let mut busy = BTreeSet::new();
        let mut result = Err(FleetError::AllocationExhausted {
            attempts: MAX_ALLOCATION_ATTEMPTS,
        });

        for attempt in 1..=MAX_ALLOCATION_ATTEMPTS {
            let offset = registry.take_offset(&busy);
            let gateway = gateway_port_for(offset);
            let bridge = gateway.saturating_add(u32::from(BRIDGE_OFFSET));

            if bridge > u32::from(MAX_PORT) {
                result = Err(FleetError::RangeExceeded {
                    offset,
                    port: bridge,
                    max: MAX_PORT,
                });
                break;
            }

            let pair = PortPair {
                gateway: gateway as u16,
                bridge: bridge as u16,
            };

            if let Some(holder) = registry.footprint_overlap(pair.gateway) {
                tracing::debug!(
                    offset,
                    ports = %pair,
                    holder = %holder.name,
                    "Offset overlaps a registered instance, skipping"
                );
                busy.insert(offset);
                continue;
            }

            if self.probe.is_available(pair.gateway) && self.probe.is_available(pair.bridge) {
                tracing::debug!(offset, ports = %pair, attempt, "Allocated port pair");
                result = Ok(pair);
                break;
            }

            tracing::debug!(offset, ports = %pair, attempt, "Port pair busy on host, retrying");
            busy.insert(offset);
        }

        for offset in busy {
            registry.reclaim(offset);
        }

        if let Err(e) = &result {
            tracing::warn!(error = %e, "Port allocation failed");
        }
        result
    }

    /// Validate a caller-supplied gateway port.
    ///
    /// No offset bookkeeping happens on this path. Only exact gateway or
    /// bridge matches against registered instances are rejected; landing
    /// inside another instance's auxiliary range is allowed here, unlike
    /// automatic allocation.
    pub fn check_explicit(&self, registry: &Registry, port: u32) -> FleetResult<PortPair> {
        if port < u32::from(MIN_EXPLICIT_PORT) || port > u32::from(MAX_EXPLICIT_PORT) {
            return Err(FleetError::PortOutOfRange {
                port,
                min: MIN_EXPLICIT_PORT,
                max: MAX_EXPLICIT_PORT,
            });
        }

        let pair = PortPair::from_gateway(port as u16).ok_or(FleetError::PortOutOfRange {
            port,
            min: MIN_EXPLICIT_PORT,
            max: MAX_EXPLICIT_PORT,
        })?;

        for candidate in [pair.gateway, pair.bridge] {
            if let Some(holder) = registry.holder_of_port(candidate) {
                return Err(FleetError::PortInUse {
                    port: candidate,
                    holder: Some(holder.name.clone()),
                });
            }
            if !self.probe.is_available(candidate) {
                return Err(FleetError::PortInUse {
                    port: candidate,
                    holder: None,
                });
            }
        }

        Ok(pair)
    }

    /// Return a destroyed instance's offset to the pool.
    ///
    /// Instances on explicit, off-grid ports hold no offset. An offset still
    /// occupied by another registered instance stays out of the pool.
    pub fn reclaim(&self, registry: &mut Registry, instance: &Instance) -> Option<u32> {
        let Some(offset) = registry.offset_of(instance) else {
            tracing::debug!(
                instance = %instance.name,
                port = instance.gateway_port,
                "Explicit port holds no offset, nothing to reclaim"
            );
            return None;
        };

        if registry.offset_in_use(offset, Some(&instance.name)) {
            tracing::warn!(
                instance = %instance.name,
                offset,
                "Offset still used by another instance, not reclaiming"
            );
            return None;
        }

        registry.reclaim(offset).then_some(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::constants::ports::{BASE_PORT, PORT_STEP};
    use chrono::Utc;
    use parking_lot::Mutex;
    use std::collections::HashSet;
    use std::path::PathBuf;

    /// Probe reporting a fixed set of ports as taken, recording every query.
    #[derive(Default)]
    struct ScriptedProbe {
        taken: HashSet<u16>,
        queried: Mutex<Vec<u16>>,
    }

    impl ScriptedProbe {
        fn taking(ports: &[u16]) -> Self {
            Self {
                taken: ports.iter().copied().collect(),
                queried: Mutex::new(Vec::new()),
            }
        }
    }

    impl PortProbe for ScriptedProbe {
        fn is_available(&self, port: u16) -> bool {
            self.queried.lock().push(port);
            !self.taken.contains(&port)
        }
    }

    fn allocator(probe: ScriptedProbe) -> (PortAllocator, Arc<ScriptedProbe>) {
        let probe = Arc::new(probe);
        (PortAllocator::new(probe.clone()), probe)
    }

    fn instance_at(name: &str, gateway_port: u16) -> Instance {
        Instance {
            name: name.to_string(),
            gateway_port,
            bridge_port: gateway_port + 1,
            config_dir: PathBuf::from(format!("/tmp/{name}")),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_allocates_base_pair_first() {
        let (allocator, _) = allocator(ScriptedProbe::default());
        let mut registry = Registry::default();

        let pair = allocator.allocate(&mut registry).unwrap();

        assert_eq!(pair.gateway, BASE_PORT);
        assert_eq!(pair.bridge, BASE_PORT + 1);
        assert_eq!(registry.next_port_offset, 1);
    }

    #[test]
    fn test_reuses_lowest_reclaimed_offset() {
        let (allocator, _) = allocator(ScriptedProbe::default());
        let mut registry = Registry {
            next_port_offset: 6,
            available_offsets: vec![2, 4],
            ..Default::default()
        };

        let pair = allocator.allocate(&mut registry).unwrap();

        assert_eq!(pair.gateway, BASE_PORT + 2 * PORT_STEP);
        assert_eq!(registry.available_offsets, vec![4]);
        assert_eq!(registry.next_port_offset, 6);
    }

    #[test]
    fn test_busy_candidate_is_skipped_and_returned_to_pool() {
        let (allocator, _) = allocator(ScriptedProbe::taking(&[BASE_PORT + 1]));
        let mut registry = Registry::default();

        let pair = allocator.allocate(&mut registry).unwrap();

        assert_eq!(pair.gateway, BASE_PORT + PORT_STEP);
        assert_eq!(registry.next_port_offset, 2);
        assert_eq!(registry.available_offsets, vec![0]);
    }

    #[test]
    fn test_busy_reclaimed_offset_does_not_starve_retries() {
        let (allocator, _) = allocator(ScriptedProbe::taking(&[BASE_PORT]));
        let mut registry = Registry {
            next_port_offset: 3,
            available_offsets: vec![0],
            ..Default::default()
        };

        let pair = allocator.allocate(&mut registry).unwrap();

        assert_eq!(pair.gateway, BASE_PORT + 3 * PORT_STEP);
        assert_eq!(registry.available_offsets, vec![0]);
        assert_eq!(registry.next_port_offset, 4);
    }

    #[test]
    fn test_exhaustion_after_attempt_ceiling() {
        let taken: Vec<u16> = (0..MAX_ALLOCATION_ATTEMPTS as u16)
            .map(|k| BASE_PORT + k * PORT_STEP)
            .collect();
        let (allocator, probe) = allocator(ScriptedProbe::taking(&taken));
        let mut registry = Registry::default();

        let err = allocator.allocate(&mut registry).unwrap_err();

        assert!(matches!(
            err,
            FleetError::AllocationExhausted { attempts } if attempts == MAX_ALLOCATION_ATTEMPTS
        ));
        assert_eq!(probe.queried.lock().len(), MAX_ALLOCATION_ATTEMPTS);
        assert_eq!(
            registry.available_offsets,
            (0..MAX_ALLOCATION_ATTEMPTS as u32).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_range_exceeded_for_offset_past_port_space() {
        let (allocator, probe) = allocator(ScriptedProbe::default());
        let last_valid = (u32::from(MAX_PORT) - 1 - u32::from(BASE_PORT)) / u32::from(PORT_STEP);
        let mut registry = Registry {
            next_port_offset: last_valid + 1,
            ..Default::default()
        };

        let err = allocator.allocate(&mut registry).unwrap_err();

        assert!(matches!(
            err,
            FleetError::RangeExceeded { offset, .. } if offset == last_valid + 1
        ));
        assert!(probe.queried.lock().is_empty());
        assert!(registry.available_offsets.is_empty());
    }

    #[test]
    fn test_explicit_port_inside_auxiliary_range_is_accepted() {
        let (allocator, _) = allocator(ScriptedProbe::default());
        let mut registry = Registry::default();
        registry.insert(instance_at("alpha", BASE_PORT));

        let pair = allocator.check_explicit(&registry, u32::from(BASE_PORT) + 20).unwrap();

        assert_eq!(pair.gateway, BASE_PORT + 20);
        assert!(registry.footprint_overlap(pair.gateway).is_some());
    }

    #[test]
    fn test_huge_watermark_is_range_exceeded_not_overflow() {
        let (allocator, probe) = allocator(ScriptedProbe::default());
        let mut registry = Registry {
            next_port_offset: 40_000_000,
            ..Default::default()
        };

        let err = allocator.allocate(&mut registry).unwrap_err();

        assert!(matches!(
            err,
            FleetError::RangeExceeded { offset: 40_000_000, port: u32::MAX, .. }
        ));
        assert!(probe.queried.lock().is_empty());
    }

    #[test]
    fn test_skips_offset_overlapping_explicit_instance() {
        let (allocator, _) = allocator(ScriptedProbe::default());
        let mut registry = Registry::default();
        registry.insert(instance_at("manual", BASE_PORT + 5));

        let pair = allocator.allocate(&mut registry).unwrap();

        assert_eq!(pair.gateway, BASE_PORT + PORT_STEP);
        assert_eq!(registry.available_offsets, vec![0]);
    }

    #[test]
    fn test_explicit_port_range() {
        let (allocator, _) = allocator(ScriptedProbe::default());
        let registry = Registry::default();

        for port in [0u32, 80, 1023, 65535, 70000] {
            let err = allocator.check_explicit(&registry, port).unwrap_err();
            assert!(matches!(err, FleetError::PortOutOfRange { .. }), "port {port}");
        }

        assert!(allocator.check_explicit(&registry, 1024).is_ok());
        let pair = allocator.check_explicit(&registry, 65534).unwrap();
        assert_eq!(pair.bridge, 65535);
    }

    #[test]
    fn test_explicit_port_probes_both_ports() {
        let (allocator, probe) = allocator(ScriptedProbe::taking(&[4001]));
        let registry = Registry::default();

        let err = allocator.check_explicit(&registry, 4000).unwrap_err();

        assert!(matches!(err, FleetError::PortInUse { port: 4001, holder: None }));
        assert_eq!(*probe.queried.lock(), vec![4000, 4001]);
    }

    #[test]
    fn test_explicit_port_conflicts_with_registered_instance() {
        let (allocator, probe) = allocator(ScriptedProbe::default());
        let mut registry = Registry::default();
        registry.insert(instance_at("alpha", 4000));

        let err = allocator.check_explicit(&registry, 3999).unwrap_err();

        assert!(matches!(
            err,
            FleetError::PortInUse { port: 4000, holder: Some(ref h) } if h == "alpha"
        ));
        assert_eq!(*probe.queried.lock(), vec![3999]);
    }

    #[test]
    fn test_explicit_port_leaves_bookkeeping_alone() {
        let (allocator, _) = allocator(ScriptedProbe::default());
        let registry = Registry {
            next_port_offset: 2,
            available_offsets: vec![1],
            ..Default::default()
        };
        let before = registry.clone();

        allocator.check_explicit(&registry, 5000).unwrap();

        assert_eq!(registry, before);
    }

    #[test]
    fn test_reclaim_grid_instance() {
        let (allocator, _) = allocator(ScriptedProbe::default());
        let mut registry = Registry {
            next_port_offset: 3,
            ..Default::default()
        };
        let instance = instance_at("alpha", BASE_PORT + PORT_STEP);

        assert_eq!(allocator.reclaim(&mut registry, &instance), Some(1));
        assert_eq!(registry.available_offsets, vec![1]);
    }

    #[test]
    fn test_reclaim_explicit_instance_is_noop() {
        let (allocator, _) = allocator(ScriptedProbe::default());
        let mut registry = Registry {
            next_port_offset: 3,
            ..Default::default()
        };

        assert_eq!(allocator.reclaim(&mut registry, &instance_at("manual", 4000)), None);
        assert!(registry.available_offsets.is_empty());
    }

    #[test]
    fn test_reclaim_skips_offset_shared_with_live_instance() {
        let (allocator, _) = allocator(ScriptedProbe::default());
        let mut registry = Registry {
            next_port_offset: 3,
            ..Default::default()
        };
        registry.insert(instance_at("auto", BASE_PORT));
        let duplicate = instance_at("manual", BASE_PORT);

        assert_eq!(allocator.reclaim(&mut registry, &duplicate), None);
        assert!(registry.available_offsets.is_empty());
    }
}
