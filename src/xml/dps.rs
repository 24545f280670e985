//! Writers for the `DPS` element and its groups, in schema order.

use std::borrow::Cow;

use rust_decimal::Decimal;

use super::NFSE_NAMESPACE;
use super::generator::TaxGroupDefaults;
use super::tree::XmlBuilder;
use crate::core::*;

/// Write `<DPS><infDPS Id=..>..</infDPS></DPS>` with `dhEmi` taken from `issued_at`.
pub(crate) fn write_dps(
    b: &mut XmlBuilder,
    dps: &Dps,
    id: &str,
    issued_at: &str,
    defaults: TaxGroupDefaults,
) {
    b.add_group("DPS", &[("xmlns", NFSE_NAMESPACE), ("versao", &dps.version)], |b| {
        b.add_group("infDPS", &[("Id", id)], |b| {
            write_header(b, dps, issued_at);
            if let Some(subst) = &dps.substitution {
                b.add_group("subst", &[], |b| {
                    b.add_element("chSubstda", &subst.replaced_key)
                        .add_element("cMotivo", &subst.reason_code)
                        .add_element("xMotivo", &subst.reason);
                });
            }
            write_provider(b, &dps.provider);
            write_party(b, "toma", &dps.taker);
            if let Some(intermediary) = &dps.intermediary {
                write_party(b, "interm", intermediary);
            }
            write_service(b, &dps.service);
            write_values(b, &dps.values, defaults);
        });
    });
}

pub(crate) fn write_header(b: &mut XmlBuilder, dps: &Dps, issued_at: &str) {
    b.add_element("tpAmb", dps.environment.code())
        .add_date("dhEmi", issued_at)
        .add_element("verAplic", &dps.app_version)
        .add_element("serie", &dps.series)
        .add_element("nDPS", &dps.number)
        .add_element("dCompet", &dps.competence)
        .add_element("tpEmit", dps.emitter_role.code())
        .add_element("cLocEmi", &dps.emission_municipality);
}

/// The identification choice. Federal documents are written as bare digits.
pub(crate) fn write_identification(b: &mut XmlBuilder, id: &Identification) {
    let value: Cow<'_, str> = match id.federal_document() {
        Some(doc) => Cow::Owned(clean_digits(doc)),
        None => Cow::Borrowed(id.value()),
    };
    b.add_element(id.tag(), &*value);
}

pub(crate) fn write_regime(b: &mut XmlBuilder, regime: &TaxRegime) {
    b.add_group("regTrib", &[], |b| {
        b.add_element("opSimpNac", regime.simples_nacional.code())
            .add_optional("regApTribSN", regime.simples_apuration)
            .add_element("regEspTrib", regime.special_regime);
    });
}

fn write_provider(b: &mut XmlBuilder, provider: &Provider) {
    b.add_group("prest", &[], |b| {
        write_identification(b, &provider.identification);
        b.add_element("IM", &provider.municipal_registration)
            .add_element("xNome", &provider.name);
        if let Some(address) = &provider.address {
            write_address(b, address);
        }
        write_contact(b, &provider.phone, &provider.email);
        write_regime(b, &provider.regime);
    });
}

fn write_party(b: &mut XmlBuilder, tag: &str, party: &Party) {
    b.add_group(tag, &[], |b| {
        write_identification(b, &party.identification);
        b.add_element("IM", &party.municipal_registration)
            .add_element("xNome", &party.name);
        if let Some(address) = &party.address {
            write_address(b, address);
        }
        write_contact(b, &party.phone, &party.email);
    });
}

fn write_contact(b: &mut XmlBuilder, phone: &Option<String>, email: &Option<String>) {
    b.add_element("fone", phone.as_deref().map(clean_digits))
        .add_element("email", email);
}

fn write_foreign_location(
    b: &mut XmlBuilder,
    country_code: &str,
    postal_code: &Option<String>,
    city: &str,
    state: &Option<String>,
) {
    b.add_group("endExt", &[], |b| {
        b.add_element("cPais", country_code)
            .add_element("cEndPost", postal_code)
            .add_element("xCidade", city)
            .add_element("xEstProvReg", state);
    });
}

fn write_street(b: &mut XmlBuilder, address: &Address) {
    b.add_element("xLgr", &address.street)
        .add_element("nro", &address.number)
        .add_element("xCpl", &address.complement)
        .add_element("xBairro", &address.district);
}

/// Party address: `endNac{cMun,CEP}` or `endExt`, then street lines.
fn write_address(b: &mut XmlBuilder, address: &Address) {
    b.add_group("end", &[], |b| {
        match &address.location {
            AddressLocation::National {
                municipality_code,
                postal_code,
            } => {
                b.add_group("endNac", &[], |b| {
                    b.add_element("cMun", municipality_code)
                        .add_element("CEP", clean_digits(postal_code));
                });
            }
            AddressLocation::Foreign {
                country_code,
                postal_code,
                city,
                state,
            } => write_foreign_location(b, country_code, postal_code, city, state),
        }
        write_street(b, address);
    });
}

/// Work/event site address: a bare `CEP` instead of `endNac`.
fn write_site_address(b: &mut XmlBuilder, address: &Address) {
    b.add_group("end", &[], |b| {
        match &address.location {
            AddressLocation::National { postal_code, .. } => {
                b.add_element("CEP", clean_digits(postal_code));
            }
            AddressLocation::Foreign {
                country_code,
                postal_code,
                city,
                state,
            } => write_foreign_location(b, country_code, postal_code, city, state),
        }
        write_street(b, address);
    });
}

pub(crate) fn write_service_location(b: &mut XmlBuilder, location: &ServiceLocation) {
    b.add_group("locPrest", &[], |b| {
        match location {
            ServiceLocation::Municipality(code) => b.add_element("cLocPrestacao", code),
            ServiceLocation::Country(code) => b.add_element("cPaisPrestacao", code),
        };
    });
}

fn write_service(b: &mut XmlBuilder, service: &Service) {
    b.add_group("serv", &[], |b| {
        write_service_location(b, &service.location);
        let code = &service.code;
        b.add_group("cServ", &[], |b| {
            b.add_element("cTribNac", &code.national_code)
                .add_element("cTribMun", &code.municipal_code)
                .add_element("xDescServ", &code.description)
                .add_element("cNBS", &code.nbs_code)
                .add_element("cIntContrib", &code.internal_code);
        });

        if let Some(trade) = &service.foreign_trade {
            b.add_group("comExt", &[], |b| {
                b.add_element("mdPrestacao", trade.delivery_mode)
                    .add_element("vincPrest", trade.relationship)
                    .add_element("tpMoeda", &trade.currency)
                    .add_number("vServMoeda", trade.amount_in_currency, 2)
                    .add_element("mecAFComexP", &trade.provider_support)
                    .add_element("mecAFComexT", &trade.taker_support)
                    .add_element("movTempBens", trade.temporary_goods)
                    .add_element("nDI", &trade.import_declaration)
                    .add_element("nRE", &trade.export_registration)
                    .add_element("mdic", trade.send_to_mdic);
            });
        }

        if let Some(lease) = &service.leasing {
            b.add_group("lsadppu", &[], |b| {
                b.add_element("categ", lease.category)
                    .add_element("objeto", lease.object)
                    .add_element("extensao", &lease.length)
                    .add_element("nPostes", lease.poles);
            });
        }

        if let Some(work) = &service.construction {
            b.add_group("obra", &[], |b| {
                b.add_element("inscImobFisc", &work.property_registration);
                match &work.site {
                    ConstructionSite::WorkCode(code) => {
                        b.add_element("cObra", code);
                    }
                    ConstructionSite::Address(address) => write_site_address(b, address),
                }
            });
        }

        if let Some(event) = &service.event {
            b.add_group("atvEvento", &[], |b| {
                b.add_element("xNome", &event.name)
                    .add_element("dtIni", event.start.format("%Y-%m-%d").to_string())
                    .add_element("dtFim", event.end.format("%Y-%m-%d").to_string());
                match &event.site {
                    EventSite::EventId(id) => {
                        b.add_element("idAtvEvt", id);
                    }
                    EventSite::Address(address) => write_site_address(b, address),
                }
            });
        }

        if let Some(road) = &service.road {
            b.add_group("explRod", &[], |b| {
                b.add_element("categVeic", road.vehicle_category)
                    .add_element("nEixos", road.axles)
                    .add_element("rodagem", road.wheelset)
                    .add_element("sentido", &road.direction)
                    .add_element("placa", &road.plate)
                    .add_element("codAcessoPed", &road.toll_access_code)
                    .add_element("codContrato", &road.contract_code);
            });
        }

        if let Some(info) = service.complementary.as_ref().filter(|i| has_complementary(i)) {
            b.add_group("infoCompl", &[], |b| {
                b.add_element("idDocTec", &info.technical_document)
                    .add_element("docRef", &info.reference_document)
                    .add_element("xInfComp", &info.text);
            });
        }
    });
}

fn has_complementary(info: &ComplementaryInfo) -> bool {
    [&info.technical_document, &info.reference_document, &info.text]
        .iter()
        .any(|v| v.as_deref().is_some_and(|s| !s.trim().is_empty()))
}

fn write_values(b: &mut XmlBuilder, values: &Values, defaults: TaxGroupDefaults) {
    b.add_group("valores", &[], |b| {
        b.add_group("vServPrest", &[], |b| {
            b.add_number("vReceb", values.service.received, 2)
                .add_number("vServ", values.service.amount, 2);
        });

        if let Some(d) = values
            .discounts
            .as_ref()
            .filter(|d| d.unconditional.is_some() || d.conditional.is_some())
        {
            b.add_group("vDescCondIncond", &[], |b| {
                b.add_number("vDescIncond", d.unconditional, 2)
                    .add_number("vDescCond", d.conditional, 2);
            });
        }

        if let Some(d) = values
            .deduction
            .as_ref()
            .filter(|d| d.percentage.is_some() || d.amount.is_some())
        {
            b.add_group("vDedRed", &[], |b| {
                b.choice()
                    .when_some(d.percentage, |b, p| {
                        b.add_number("pDR", p, 2);
                    })
                    .when_some(d.amount, |b, v| {
                        b.add_number("vDR", v, 2);
                    });
            });
        }

        b.add_group("trib", &[], |b| {
            write_municipal_tax(b, &values.taxation.municipal);

            let federal = match &values.taxation.federal {
                Some(federal) => Some(Cow::Borrowed(federal)),
                None if defaults.federal => {
                    tracing::debug!("tribFed not supplied, emitting zero-filled group");
                    Some(Cow::Owned(TaxGroupDefaults::zero_federal()))
                }
                None => None,
            };
            if let Some(federal) = federal {
                write_federal_tax(b, &federal);
            }

            let totals = match values.taxation.totals.as_ref().filter(|t| has_totals(t)) {
                Some(totals) => Some(Cow::Borrowed(totals)),
                None if defaults.totals => {
                    tracing::debug!("totTrib not supplied, emitting zero-filled group");
                    Some(Cow::Owned(TaxGroupDefaults::zero_totals()))
                }
                None => None,
            };
            if let Some(totals) = totals {
                write_tax_totals(b, &totals);
            }
        });
    });
}

fn write_municipal_tax(b: &mut XmlBuilder, m: &MunicipalTax) {
    b.add_group("tribMun", &[], |b| {
        b.add_element("tribISSQN", m.situation.code());
        if m.situation == IssqnSituation::Export {
            b.add_element("cPaisResult", &m.result_country);
        }
        if let Some(bm) = &m.benefit {
            b.add_group("BM", &[], |b| {
                b.add_element("nBM", &bm.number);
                b.choice()
                    .when_some(bm.reduction_amount, |b, v| {
                        b.add_number("vRedBCBM", v, 2);
                    })
                    .when_some(bm.reduction_percentage, |b, p| {
                        b.add_number("pRedBCBM", p, 2);
                    });
            });
        }
        if let Some(susp) = &m.suspension {
            b.add_group("exigSusp", &[], |b| {
                b.add_element("tpSusp", susp.kind)
                    .add_element("nProcesso", &susp.process_number);
            });
        }
        if m.situation == IssqnSituation::Immune {
            b.add_element("tpImunidade", m.immunity_type);
        }
        if m.situation == IssqnSituation::Taxable {
            b.add_number("pAliq", m.rate, 2)
                .add_element("tpRetISSQN", m.withholding.map(|w| w.code()));
        }
    });
}

fn write_federal_tax(b: &mut XmlBuilder, f: &FederalTax) {
    b.add_group("tribFed", &[], |b| {
        if let Some(pc) = &f.pis_cofins {
            b.add_group("piscofins", &[], |b| {
                b.add_element("CST", &pc.cst)
                    .add_number("vBCPisCofins", pc.base, 2)
                    .add_number("pAliqPis", pc.pis_rate, 2)
                    .add_number("pAliqCofins", pc.cofins_rate, 2)
                    .add_number("vPis", pc.pis_amount, 2)
                    .add_number("vCofins", pc.cofins_amount, 2)
                    .add_element("tpRetPisCofins", pc.withholding);
            });
        }
        b.add_number("vRetCP", f.withheld_cp, 2)
            .add_number("vRetIRRF", f.withheld_irrf, 2)
            .add_number("vRetCSLL", f.withheld_csll, 2);
    });
}

fn has_totals(t: &TaxTotals) -> bool {
    t.amounts.is_some() || t.percentages.is_some() || t.indicator.is_some() || t.simples_rate.is_some()
}

fn write_split(b: &mut XmlBuilder, tag: &str, prefix: &str, split: &TaxSplit) {
    let field = |suffix: &str| format!("{prefix}{suffix}");
    b.add_group(tag, &[], |b| {
        b.add_number(&field("Fed"), split.federal, 2)
            .add_number(&field("Est"), split.state, 2)
            .add_number(&field("Mun"), split.municipal, 2);
    });
}

fn write_tax_totals(b: &mut XmlBuilder, t: &TaxTotals) {
    b.add_group("totTrib", &[], |b| {
        b.choice()
            .when_some(t.amounts.as_ref(), |b, split| {
                write_split(b, "vTotTrib", "vTotTrib", split)
            })
            .when_some(t.percentages.as_ref(), |b, split| {
                write_split(b, "pTotTrib", "pTotTrib", split)
            })
            .when_some(t.indicator, |b, indicator| {
                b.add_element("indTotTrib", indicator);
            })
            .when_some(t.simples_rate, |b, rate: Decimal| {
                b.add_number("pTotTribSN", rate, 2);
            });
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::generator::SPED_V1_TAX_GROUP_DEFAULTS;
    use rust_decimal_macros::dec;

    fn render(f: impl FnOnce(&mut XmlBuilder)) -> String {
        let mut b = XmlBuilder::new();
        f(&mut b);
        b.build().unwrap()
    }

    #[test]
    fn identification_digits_only() {
        let xml = render(|b| write_identification(b, &Identification::Cnpj("11.222.333/0001-81".into())));
        assert_eq!(xml, "<CNPJ>11222333000181</CNPJ>");
        let xml = render(|b| write_identification(b, &Identification::NoNif("1".into())));
        assert_eq!(xml, "<cNaoNIF>1</cNaoNIF>");
    }

    #[test]
    fn municipal_tax_for_export() {
        let m = MunicipalTax {
            situation: IssqnSituation::Export,
            result_country: Some("US".into()),
            rate: Some(dec!(5)),
            withholding: Some(IssWithholding::NotWithheld),
            ..MunicipalTax::default()
        };
        let xml = render(|b| write_municipal_tax(b, &m));
        assert!(xml.contains("<tribISSQN>3</tribISSQN>"));
        assert!(xml.contains("<cPaisResult>US</cPaisResult>"));
        assert!(!xml.contains("pAliq"));
        assert!(!xml.contains("tpRetISSQN"));
    }

    #[test]
    fn municipal_tax_for_taxable() {
        let m = MunicipalTax {
            rate: Some(dec!(2.5)),
            withholding: Some(IssWithholding::ByTaker),
            benefit: Some(MunicipalBenefit {
                number: "12".into(),
                reduction_amount: Some(dec!(10)),
                reduction_percentage: Some(dec!(50)),
            }),
            ..MunicipalTax::default()
        };
        let xml = render(|b| write_municipal_tax(b, &m));
        assert!(xml.contains("<pAliq>2.50</pAliq>"));
        assert!(xml.contains("<tpRetISSQN>2</tpRetISSQN>"));
        assert!(xml.contains("<vRedBCBM>10.00</vRedBCBM>"));
        assert!(!xml.contains("pRedBCBM"));
        assert!(!xml.contains("cPaisResult"));
    }

    #[test]
    fn totals_choice_prefers_amounts() {
        let t = TaxTotals {
            amounts: Some(TaxSplit {
                federal: dec!(1),
                state: dec!(2),
                municipal: dec!(3),
            }),
            indicator: Some(0),
            ..TaxTotals::default()
        };
        let xml = render(|b| write_tax_totals(b, &t));
        assert!(xml.contains("<vTotTribFed>1.00</vTotTribFed>"));
        assert!(xml.contains("<vTotTribMun>3.00</vTotTribMun>"));
        assert!(!xml.contains("indTotTrib"));
    }

    #[test]
    fn zero_filled_groups_follow_policy() {
        let values = Values {
            service: ServiceAmount {
                received: None,
                amount: dec!(100),
            },
            discounts: None,
            deduction: None,
            taxation: Taxation {
                municipal: MunicipalTax::default(),
                federal: None,
                totals: None,
            },
        };
        let xml = render(|b| write_values(b, &values, SPED_V1_TAX_GROUP_DEFAULTS));
        assert!(xml.contains("<CST>00</CST>"));
        assert!(xml.contains("<vRetIRRF>0.00</vRetIRRF>"));
        assert!(xml.contains("<vTotTribEst>0.00</vTotTribEst>"));

        let off = TaxGroupDefaults {
            federal: false,
            totals: false,
        };
        let xml = render(|b| write_values(b, &values, off));
        assert!(!xml.contains("tribFed"));
        assert!(!xml.contains("totTrib"));
    }

    #[test]
    fn deduction_percentage_wins() {
        let values = Values {
            service: ServiceAmount::default(),
            discounts: Some(Discounts::default()),
            deduction: Some(Deduction {
                percentage: Some(dec!(10)),
                amount: Some(dec!(50)),
            }),
            taxation: Taxation {
                municipal: MunicipalTax::default(),
                federal: None,
                totals: None,
            },
        };
        let xml = render(|b| write_values(b, &values, SPED_V1_TAX_GROUP_DEFAULTS));
        assert!(xml.contains("<pDR>10.00</pDR>"));
        assert!(!xml.contains("<vDR>"));
        assert!(!xml.contains("vDescCondIncond"));
    }
}
