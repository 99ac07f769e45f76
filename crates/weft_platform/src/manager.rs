//! The constraint manager.

use crate::bundle::{Constraint, PinBundle, PlatformCommand, ResourceName, SigConstraint};
use crate::error::ConstraintError;
use std::collections::BTreeMap;
use tracing::debug;
use weft_config::ResourceDef;
use weft_ir::{SignalDb, SignalId};

/// Resolves named I/O requests against the platform's resource list.
///
/// Each resource instance (name plus number) can be granted once. Granted
/// signals are allocated unscoped in the shared [`SignalDb`] so they keep the
/// resource name at the top level of the design.
#[derive(Debug)]
pub struct ConstraintManager {
    available: Vec<ResourceDef>,
    requested: Vec<(usize, PinBundle)>,
    commands: Vec<PlatformCommand>,
}

impl ConstraintManager {
    /// Creates a manager over the given resources.
    pub fn new(resources: Vec<ResourceDef>) -> Self {
        Self {
            available: resources,
            requested: Vec::new(),
            commands: Vec::new(),
        }
    }

    /// Requests a resource.
    ///
    /// With `number` omitted, the first instance not yet granted is chosen, in
    /// resource declaration order.
    pub fn request(
        &mut self,
        db: &mut SignalDb,
        name: &str,
        number: Option<u32>,
    ) -> Result<PinBundle, ConstraintError> {
        let index = self.select(name, number)?;
        let res = &self.available[index];
        let bundle = if res.subsignals.is_empty() {
            PinBundle::Single(db.alloc(res.name.clone(), pin_width(&res.pins)))
        } else {
            PinBundle::Compound(
                res.subsignals
                    .iter()
                    .map(|sub| {
                        let id = db.alloc(format!("{}_{}", res.name, sub.name), pin_width(&sub.pins));
                        (sub.name.clone(), id)
                    })
                    .collect(),
            )
        };
        debug!(resource = %res.name, number = res.number, "granted platform resource");
        self.requested.push((index, bundle.clone()));
        Ok(bundle)
    }

    fn select(&self, name: &str, number: Option<u32>) -> Result<usize, ConstraintError> {
        let is_taken = |i: usize| self.requested.iter().any(|(r, _)| *r == i);
        let mut candidates = self
            .available
            .iter()
            .enumerate()
            .filter(|(_, r)| r.name == name)
            .peekable();
        if candidates.peek().is_none() {
            return Err(ConstraintError::UnknownResource {
                name: name.to_string(),
                number,
            });
        }
        match number {
            Some(n) => {
                let (index, _) = candidates.find(|(_, r)| r.number == n).ok_or_else(|| {
                    ConstraintError::UnknownResource {
                        name: name.to_string(),
                        number,
                    }
                })?;
                if is_taken(index) {
                    return Err(ConstraintError::AlreadyRequested {
                        name: name.to_string(),
                        number: n,
                    });
                }
                Ok(index)
            }
            None => candidates
                .map(|(i, _)| i)
                .find(|i| !is_taken(*i))
                .ok_or_else(|| ConstraintError::ResourceExhausted {
                    name: name.to_string(),
                }),
        }
    }

    /// Every granted top-level signal, in grant order.
    pub fn io_signals(&self) -> Vec<SignalId> {
        self.requested
            .iter()
            .flat_map(|(_, bundle)| bundle.signals())
            .collect()
    }

    /// Pin assignment and constraints of every granted signal.
    pub fn sig_constraints(&self) -> Vec<SigConstraint> {
        let mut out = Vec::new();
        for (index, bundle) in &self.requested {
            let res = &self.available[*index];
            let top = Constraint::from_attrs(&res.attrs);
            let origin = |subsignal: Option<&str>| ResourceName {
                name: res.name.clone(),
                number: res.number,
                subsignal: subsignal.map(str::to_string),
            };
            match bundle {
                PinBundle::Single(signal) => out.push(SigConstraint {
                    signal: *signal,
                    pins: res.pins.clone(),
                    constraints: top.clone(),
                    resource: origin(None),
                }),
                PinBundle::Compound(subs) => {
                    for ((sub_name, signal), sub) in subs.iter().zip(&res.subsignals) {
                        let mut constraints = top.clone();
                        constraints.extend(Constraint::from_attrs(&sub.attrs));
                        out.push(SigConstraint {
                            signal: *signal,
                            pins: sub.pins.clone(),
                            constraints,
                            resource: origin(Some(sub_name.as_str())),
                        });
                    }
                }
            }
        }
        out
    }

    /// Records a verbatim toolchain command.
    pub fn add_platform_command(
        &mut self,
        template: impl Into<String>,
        args: BTreeMap<String, SignalId>,
    ) {
        self.commands.push(PlatformCommand {
            template: template.into(),
            args,
        });
    }

    /// Recorded toolchain commands, in insertion order.
    pub fn platform_commands(&self) -> &[PlatformCommand] {
        &self.commands
    }
}

fn pin_width(pins: &[String]) -> u32 {
    pins.len().max(1) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_config::{IoAttrs, SubsignalDef};

    fn plain(name: &str, number: u32, pins: &[&str]) -> ResourceDef {
        ResourceDef {
            name: name.into(),
            number,
            pins: pins.iter().map(|p| p.to_string()).collect(),
            subsignals: Vec::new(),
            attrs: IoAttrs {
                io_standard: Some("LVCMOS33".into()),
                ..IoAttrs::default()
            },
        }
    }

    fn platform() -> ConstraintManager {
        let adc = ResourceDef {
            name: "ti_adc".into(),
            number: 0,
            pins: Vec::new(),
            subsignals: vec![
                SubsignalDef {
                    name: "dat_a_p".into(),
                    pins: vec!["A1".into(), "A2".into()],
                    attrs: IoAttrs {
                        misc: vec!["DIFF_TERM=TRUE".into()],
                        ..IoAttrs::default()
                    },
                },
                SubsignalDef {
                    name: "dat_a_n".into(),
                    pins: vec!["B1".into(), "B2".into()],
                    attrs: IoAttrs::default(),
                },
            ],
            attrs: IoAttrs {
                io_standard: Some("LVDS_25".into()),
                ..IoAttrs::default()
            },
        };
        ConstraintManager::new(vec![
            plain("gpmc_ce_n", 0, &["C1"]),
            plain("gpmc_ce_n", 1, &["C2"]),
            plain("user_led", 0, &["D1", "D2", "D3"]),
            adc,
        ])
    }

    #[test]
    fn plain_request_allocates_pin_width() {
        let mut db = SignalDb::new();
        let mut cm = platform();
        let led = cm.request(&mut db, "user_led", None).unwrap();
        let sig = led.signal().unwrap();
        assert_eq!(db[sig].width, 3);
        assert_eq!(db[sig].name, "user_led");
        assert_eq!(cm.io_signals(), vec![sig]);
    }

    #[test]
    fn omitted_number_takes_first_free_instance() {
        let mut db = SignalDb::new();
        let mut cm = platform();
        cm.request(&mut db, "gpmc_ce_n", Some(0)).unwrap();
        cm.request(&mut db, "gpmc_ce_n", None).unwrap();
        let constraints = cm.sig_constraints();
        assert_eq!(constraints[1].resource.number, 1);
        assert_eq!(constraints[1].pins, vec!["C2"]);
    }

    #[test]
    fn exhausted_when_all_instances_taken() {
        let mut db = SignalDb::new();
        let mut cm = platform();
        cm.request(&mut db, "gpmc_ce_n", None).unwrap();
        cm.request(&mut db, "gpmc_ce_n", None).unwrap();
        let err = cm.request(&mut db, "gpmc_ce_n", None).unwrap_err();
        assert!(matches!(err, ConstraintError::ResourceExhausted { .. }));
    }

    #[test]
    fn same_instance_twice_fails() {
        let mut db = SignalDb::new();
        let mut cm = platform();
        cm.request(&mut db, "gpmc_ce_n", Some(1)).unwrap();
        let err = cm.request(&mut db, "gpmc_ce_n", Some(1)).unwrap_err();
        assert_eq!(
            err,
            ConstraintError::AlreadyRequested {
                name: "gpmc_ce_n".into(),
                number: 1
            }
        );
    }

    #[test]
    fn unknown_name_and_number() {
        let mut db = SignalDb::new();
        let mut cm = platform();
        assert!(matches!(
            cm.request(&mut db, "ethernet", None),
            Err(ConstraintError::UnknownResource { number: None, .. })
        ));
        assert!(matches!(
            cm.request(&mut db, "gpmc_ce_n", Some(7)),
            Err(ConstraintError::UnknownResource {
                number: Some(7),
                ..
            })
        ));
    }

    #[test]
    fn compound_constraints_merge_levels() {
        let mut db = SignalDb::new();
        let mut cm = platform();
        let adc = cm.request(&mut db, "ti_adc", None).unwrap();
        let p = adc.subsignal("dat_a_p").unwrap();
        assert_eq!(db[p].name, "ti_adc_dat_a_p");
        assert_eq!(db[p].width, 2);

        let constraints = cm.sig_constraints();
        assert_eq!(constraints.len(), 2);
        assert_eq!(constraints[0].signal, p);
        assert_eq!(
            constraints[0].constraints,
            vec![
                Constraint::IoStandard("LVDS_25".into()),
                Constraint::Misc("DIFF_TERM=TRUE".into())
            ]
        );
        assert_eq!(constraints[0].resource.subsignal.as_deref(), Some("dat_a_p"));
        assert_eq!(constraints[1].constraints.len(), 1);
    }

    #[test]
    fn platform_commands_kept_in_order() {
        let mut db = SignalDb::new();
        let mut cm = platform();
        let clk = db.alloc("clk", 1);
        cm.add_platform_command(
            "NET \"{clk}\" TNM_NET = \"GRPclk\";\n",
            BTreeMap::from([("clk".to_string(), clk)]),
        );
        cm.add_platform_command("CONFIG VCCAUX = \"3.3\";\n", BTreeMap::new());
        assert_eq!(cm.platform_commands().len(), 2);
        assert_eq!(cm.platform_commands()[0].args["clk"], clk);
    }
}
