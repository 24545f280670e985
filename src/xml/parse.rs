//! DPS/NFSe XML back into the data model.
//!
//! Lookups are scoped: each field is read from a direct child of the group
//! it belongs to, so `valores` of the NFSe and of its DPS never mix. Absent
//! groups read as empty, absent required numbers as zero.

use std::str::FromStr;

use chrono::NaiveDate;
use roxmltree::{Document, Node};
use rust_decimal::Decimal;

use crate::core::*;

fn find_element<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    path: &[&str],
) -> Option<Node<'a, 'input>> {
    let Some((first, rest)) = path.split_first() else {
        return Some(node);
    };
    node.children()
        .filter(|c| c.is_element() && c.tag_name().name() == *first)
        .find_map(|c| find_element(c, rest))
}

fn find_descendant<'a, 'input: 'a>(doc: &'a Document<'input>, name: &str) -> Option<Node<'a, 'input>> {
    doc.descendants()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

/// A possibly absent element whose children are read leniently.
#[derive(Clone, Copy)]
struct Scope<'a, 'input>(Option<Node<'a, 'input>>);

impl<'a, 'input: 'a> Scope<'a, 'input> {
    fn child(self, name: &str) -> Self {
        Self(self.0.and_then(|n| find_element(n, &[name])))
    }

    fn exists(self) -> bool {
        self.0.is_some()
    }

    fn attribute(self, name: &str) -> Option<String> {
        self.0
            .and_then(|n| n.attribute(name))
            .map(str::to_string)
    }

    fn text(self, name: &str) -> Option<String> {
        self.child(name)
            .0
            .and_then(|n| n.text())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn string(self, name: &str) -> String {
        self.text(name).unwrap_or_default()
    }

    fn number<T: FromStr>(self, name: &str) -> Option<T> {
        let raw = self.text(name)?;
        match raw.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(element = name, value = %raw, "unparsable number ignored");
                None
            }
        }
    }

    fn decimal(self, name: &str) -> Option<Decimal> {
        self.number(name)
    }

    /// A required amount; zero when absent.
    fn amount(self, name: &str) -> Decimal {
        self.decimal(name).unwrap_or(Decimal::ZERO)
    }

    fn date(self, name: &str) -> NaiveDate {
        self.text(name)
            .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
            .unwrap_or_default()
    }

    /// `Some(self)` when the element is present.
    fn present(self) -> Option<Self> {
        self.exists().then_some(self)
    }
}

/// Parse a DPS, standalone or nested in an NFSe.
pub fn parse_nfse_xml(xml: &str) -> Result<Dps, NfseError> {
    let doc = Document::parse(xml).map_err(|e| NfseError::MalformedXml(e.to_string()))?;
    let inf = find_descendant(&doc, "infDPS")
        .ok_or_else(|| NfseError::SchemaMismatch("infDPS element not found".into()))?;
    Ok(read_dps(inf))
}

/// Parse a complete NFSe including its nested DPS.
pub fn parse_nfse_document(xml: &str) -> Result<Nfse, NfseError> {
    let doc = Document::parse(xml).map_err(|e| NfseError::MalformedXml(e.to_string()))?;
    let inf = find_descendant(&doc, "infNFSe")
        .ok_or_else(|| NfseError::SchemaMismatch("infNFSe element not found".into()))?;
    let dps = inf
        .descendants()
        .find(|n| n.is_element() && n.tag_name().name() == "infDPS")
        .ok_or_else(|| NfseError::SchemaMismatch("infNFSe has no infDPS".into()))?;

    let scope = Scope(Some(inf));
    Ok(Nfse {
        version: Scope(inf.parent_element())
            .attribute("versao")
            .unwrap_or_else(|| SCHEMA_VERSION.to_string()),
        header: read_nfse_header(scope),
        emitter: read_emitter(scope.child("emit")),
        values: scope.child("valores").present().map(read_nfse_values),
        dps: read_dps(dps),
    })
}

fn read_dps(inf: Node<'_, '_>) -> Dps {
    let scope = Scope(Some(inf));
    Dps {
        version: Scope(inf.parent_element())
            .attribute("versao")
            .unwrap_or_else(|| SCHEMA_VERSION.to_string()),
        environment: scope
            .number("tpAmb")
            .and_then(Environment::from_code)
            .unwrap_or_default(),
        issued_at: scope.string("dhEmi"),
        app_version: scope.string("verAplic"),
        series: scope.string("serie"),
        number: scope.string("nDPS"),
        competence: scope.string("dCompet"),
        emitter_role: scope
            .number("tpEmit")
            .and_then(EmitterRole::from_code)
            .unwrap_or_default(),
        emission_municipality: scope.string("cLocEmi"),
        substitution: scope.child("subst").present().map(|s| Substitution {
            replaced_key: s.string("chSubstda"),
            reason_code: s.string("cMotivo"),
            reason: s.text("xMotivo"),
        }),
        provider: read_provider(scope.child("prest")),
        taker: read_party(scope.child("toma")),
        intermediary: scope.child("interm").present().map(read_party),
        service: read_service(
            scope
                .child("serv")
                .present()
                .unwrap_or_else(|| scope.child("servicos")),
        ),
        values: read_values(scope.child("valores")),
    }
}

fn read_identification(scope: Scope<'_, '_>) -> Identification {
    let choices: [(&str, fn(String) -> Identification); 5] = [
        ("CNPJ", Identification::Cnpj),
        ("CPF", Identification::Cpf),
        ("NIF", Identification::Nif),
        ("cNaoNIF", Identification::NoNif),
        ("CAEPF", Identification::Caepf),
    ];
    choices
        .into_iter()
        .find_map(|(tag, make)| scope.text(tag).map(make))
        .unwrap_or_else(|| Identification::Cnpj(String::new()))
}

fn read_address(scope: Scope<'_, '_>) -> Address {
    let national = scope.child("endNac");
    let foreign = scope.child("endExt");
    let location = if national.exists() {
        AddressLocation::National {
            municipality_code: national.string("cMun"),
            postal_code: national.string("CEP"),
        }
    } else if foreign.exists() {
        AddressLocation::Foreign {
            country_code: foreign.string("cPais"),
            postal_code: foreign.text("cEndPost"),
            city: foreign.string("xCidade"),
            state: foreign.text("xEstProvReg"),
        }
    } else {
        // Site addresses carry a bare CEP.
        AddressLocation::National {
            municipality_code: String::new(),
            postal_code: scope.string("CEP"),
        }
    };
    Address {
        location,
        street: scope.string("xLgr"),
        number: scope.string("nro"),
        complement: scope.text("xCpl"),
        district: scope.string("xBairro"),
    }
}

fn read_provider(scope: Scope<'_, '_>) -> Provider {
    let party = read_party(scope);
    let regime = scope.child("regTrib");
    Provider {
        identification: party.identification,
        municipal_registration: party.municipal_registration,
        name: party.name,
        address: party.address,
        phone: party.phone,
        email: party.email,
        regime: TaxRegime {
            simples_nacional: regime
                .number("opSimpNac")
                .and_then(SimplesNacional::from_code)
                .unwrap_or_default(),
            simples_apuration: regime.number("regApTribSN"),
            special_regime: regime.number("regEspTrib").unwrap_or(0),
        },
    }
}

fn read_party(scope: Scope<'_, '_>) -> Party {
    Party {
        identification: read_identification(scope),
        municipal_registration: scope.text("IM"),
        name: scope.string("xNome"),
        address: scope.child("end").present().map(read_address),
        phone: scope.text("fone"),
        email: scope.text("email"),
    }
}

fn read_service(scope: Scope<'_, '_>) -> Service {
    let location = scope.child("locPrest");
    let code = scope.child("cServ");
    Service {
        location: match location.text("cPaisPrestacao") {
            Some(country) => ServiceLocation::Country(country),
            None => ServiceLocation::Municipality(location.string("cLocPrestacao")),
        },
        code: ServiceCode {
            national_code: code.string("cTribNac"),
            municipal_code: code.text("cTribMun"),
            description: code.string("xDescServ"),
            nbs_code: code.text("cNBS"),
            internal_code: code.text("cIntContrib"),
        },
        foreign_trade: scope.child("comExt").present().map(|s| ForeignTrade {
            delivery_mode: s.number("mdPrestacao").unwrap_or(0),
            relationship: s.number("vincPrest").unwrap_or(0),
            currency: s.string("tpMoeda"),
            amount_in_currency: s.amount("vServMoeda"),
            provider_support: s.string("mecAFComexP"),
            taker_support: s.string("mecAFComexT"),
            temporary_goods: s.number("movTempBens").unwrap_or(0),
            import_declaration: s.text("nDI"),
            export_registration: s.text("nRE"),
            send_to_mdic: s.number("mdic").unwrap_or(0),
        }),
        leasing: scope.child("lsadppu").present().map(|s| PropertyLeasing {
            category: s.number("categ").unwrap_or(0),
            object: s.number("objeto").unwrap_or(0),
            length: s.string("extensao"),
            poles: s.number("nPostes").unwrap_or(0),
        }),
        construction: scope.child("obra").present().map(|s| ConstructionWork {
            property_registration: s.text("inscImobFisc"),
            site: match s.text("cObra") {
                Some(code) => ConstructionSite::WorkCode(code),
                None => ConstructionSite::Address(read_address(s.child("end"))),
            },
        }),
        event: scope.child("atvEvento").present().map(|s| EventActivity {
            name: s.string("xNome"),
            start: s.date("dtIni"),
            end: s.date("dtFim"),
            site: match s.text("idAtvEvt") {
                Some(id) => EventSite::EventId(id),
                None => EventSite::Address(read_address(s.child("end"))),
            },
        }),
        road: scope.child("explRod").present().map(|s| RoadExploitation {
            vehicle_category: s.number("categVeic").unwrap_or(0),
            axles: s.number("nEixos").unwrap_or(0),
            wheelset: s.number("rodagem").unwrap_or(0),
            direction: s.string("sentido"),
            plate: s.string("placa"),
            toll_access_code: s.string("codAcessoPed"),
            contract_code: s.string("codContrato"),
        }),
        complementary: scope.child("infoCompl").present().map(|s| ComplementaryInfo {
            technical_document: s.text("idDocTec"),
            reference_document: s.text("docRef"),
            text: s.text("xInfComp"),
        }),
    }
}

fn read_split(scope: Scope<'_, '_>, prefix: &str) -> TaxSplit {
    TaxSplit {
        federal: scope.amount(&format!("{prefix}Fed")),
        state: scope.amount(&format!("{prefix}Est")),
        municipal: scope.amount(&format!("{prefix}Mun")),
    }
}

fn read_values(scope: Scope<'_, '_>) -> Values {
    let service = scope.child("vServPrest");
    let trib = scope.child("trib");
    Values {
        service: ServiceAmount {
            received: service.decimal("vReceb"),
            amount: service.amount("vServ"),
        },
        discounts: scope.child("vDescCondIncond").present().map(|s| Discounts {
            unconditional: s.decimal("vDescIncond"),
            conditional: s.decimal("vDescCond"),
        }),
        deduction: scope.child("vDedRed").present().map(|s| Deduction {
            percentage: s.decimal("pDR"),
            amount: s.decimal("vDR"),
        }),
        taxation: Taxation {
            municipal: read_municipal_tax(trib.child("tribMun")),
            federal: trib.child("tribFed").present().map(|s| FederalTax {
                pis_cofins: s.child("piscofins").present().map(|p| PisCofins {
                    cst: p.string("CST"),
                    base: p.decimal("vBCPisCofins"),
                    pis_rate: p.decimal("pAliqPis"),
                    cofins_rate: p.decimal("pAliqCofins"),
                    pis_amount: p.decimal("vPis"),
                    cofins_amount: p.decimal("vCofins"),
                    withholding: p.number("tpRetPisCofins"),
                }),
                withheld_cp: s.decimal("vRetCP"),
                withheld_irrf: s.decimal("vRetIRRF"),
                withheld_csll: s.decimal("vRetCSLL"),
            }),
            totals: trib.child("totTrib").present().map(|s| TaxTotals {
                amounts: s
                    .child("vTotTrib")
                    .present()
                    .map(|t| read_split(t, "vTotTrib")),
                percentages: s
                    .child("pTotTrib")
                    .present()
                    .map(|t| read_split(t, "pTotTrib")),
                indicator: s.number("indTotTrib"),
                simples_rate: s.decimal("pTotTribSN"),
            }),
        },
    }
}

fn read_municipal_tax(scope: Scope<'_, '_>) -> MunicipalTax {
    MunicipalTax {
        situation: scope
            .number("tribISSQN")
            .and_then(IssqnSituation::from_code)
            .unwrap_or_default(),
        result_country: scope.text("cPaisResult"),
        benefit: scope.child("BM").present().map(|s| MunicipalBenefit {
            number: s.string("nBM"),
            reduction_amount: s.decimal("vRedBCBM"),
            reduction_percentage: s.decimal("pRedBCBM"),
        }),
        suspension: scope.child("exigSusp").present().map(|s| SuspendedEnforceability {
            kind: s.number("tpSusp").unwrap_or(0),
            process_number: s.string("nProcesso"),
        }),
        immunity_type: scope.number("tpImunidade"),
        rate: scope.decimal("pAliq"),
        withholding: scope.number("tpRetISSQN").and_then(IssWithholding::from_code),
    }
}

fn read_nfse_header(scope: Scope<'_, '_>) -> NfseHeader {
    NfseHeader {
        emission_location: scope.string("xLocEmi"),
        service_location: scope.string("xLocPrestacao"),
        number: scope.string("nNFSe"),
        incidence_municipality: scope.string("cLocIncid"),
        incidence_location: scope.text("xLocIncid"),
        national_tax_description: scope.string("xTribNac"),
        municipal_tax_description: scope.text("xTribMun"),
        nbs_description: scope.text("xNBS"),
        app_version: scope.string("verAplic"),
        generating_environment: scope.number("ambGer").unwrap_or(0),
        emission_type: scope.number("tpEmis").unwrap_or(0),
        emission_process: scope.number("procEmi"),
        status: scope.number("cStat").unwrap_or(0),
        processed_at: scope.text("dhProc"),
        dfse_number: scope.string("nDFSe"),
    }
}

fn read_emitter(scope: Scope<'_, '_>) -> Emitter {
    let address = scope.child("enderNac");
    Emitter {
        identification: read_identification(scope),
        municipal_registration: scope.text("IM"),
        name: scope.string("xNome"),
        trade_name: scope.text("xFant"),
        address: EmitterAddress {
            street: address.string("xLgr"),
            number: address.string("nro"),
            complement: address.text("xCpl"),
            district: address.string("xBairro"),
            municipality_code: address.string("cMun"),
            state: address.string("UF"),
            postal_code: address.string("CEP"),
        },
        phone: scope.text("fone"),
        email: scope.text("email"),
    }
}

fn read_nfse_values(scope: Scope<'_, '_>) -> NfseValues {
    NfseValues {
        deduction_amount: scope.decimal("vCalcDR"),
        benefit_amount: scope.decimal("vCalcBM"),
        base: scope.amount("vBC"),
        applied_rate: scope.decimal("pAliqAplic"),
        iss_amount: scope.decimal("vISSQN"),
        total_withheld: scope.amount("vTotalRet"),
        net_amount: scope.amount("vLiq"),
    }
}
