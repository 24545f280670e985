#![allow(dead_code)]

use nfse::core::*;
use rust_decimal_macros::dec;

pub const PROVIDER_CNPJ: &str = "11222333000181";
pub const TAKER_CPF: &str = "11144477735";
pub const SAO_PAULO: &str = "3550308";
pub const RIO_DE_JANEIRO: &str = "3304557";

pub fn provider() -> Provider {
    ProviderBuilder::new(Identification::Cnpj(PROVIDER_CNPJ.into()), "Prestadora Exemplo Ltda")
        .municipal_registration("12345678")
        .address(
            AddressBuilder::national(SAO_PAULO, "01310-100", "Avenida Paulista", "1000", "Bela Vista")
                .complement("Conj. 101")
                .build(),
        )
        .phone("(11) 3333-4444")
        .email("contato@prestadora.com.br")
        .regime(TaxRegime {
            simples_nacional: SimplesNacional::MeEpp,
            simples_apuration: Some(1),
            special_regime: 0,
        })
        .build()
}

pub fn taker() -> Party {
    PartyBuilder::new(Identification::Cpf(TAKER_CPF.into()), "Maria Silva")
        .address(
            AddressBuilder::national(RIO_DE_JANEIRO, "20040-020", "Rua da Assembleia", "10", "Centro")
                .build(),
        )
        .email("maria@example.com")
        .build()
}

pub fn service_code() -> ServiceCode {
    ServiceCode {
        national_code: "010101".into(),
        municipal_code: Some("0101".into()),
        description: "Desenvolvimento de programas de computador sob encomenda".into(),
        nbs_code: Some("115013000".into()),
        internal_code: None,
    }
}

/// A DPS with only the mandatory data filled.
pub fn sample_dps() -> Dps {
    DpsBuilder::new("1", "1", SAO_PAULO)
        .issued_at("2025-06-15T10:00:00Z")
        .competence("2025-06-15")
        .provider(provider())
        .taker(taker())
        .service(ServiceLocation::Municipality(SAO_PAULO.into()), service_code())
        .service_amount(dec!(1500.00))
        .iss_rate(dec!(5))
        .build()
        .unwrap()
}

/// A DPS exercising most optional groups.
pub fn full_dps() -> Dps {
    let mut dps = DpsBuilder::new("900", "1234", SAO_PAULO)
        .environment(Environment::Production)
        .issued_at("2025-06-15T10:00:00Z")
        .competence("2025-06-01")
        .provider(provider())
        .taker(taker())
        .intermediary(
            PartyBuilder::new(Identification::Cnpj("11444777000161".into()), "Intermediadora SA").build(),
        )
        .service(ServiceLocation::Municipality(SAO_PAULO.into()), service_code())
        .service_amount(dec!(10000.00))
        .discounts(Some(dec!(500.00)), None)
        .deduction_amount(dec!(1000.00))
        .iss_rate(dec!(2.5))
        .federal_tax(FederalTax {
            pis_cofins: Some(PisCofins {
                cst: "01".into(),
                base: Some(dec!(8500.00)),
                pis_rate: Some(dec!(0.65)),
                cofins_rate: Some(dec!(3.00)),
                pis_amount: Some(dec!(55.25)),
                cofins_amount: Some(dec!(255.00)),
                withholding: Some(2),
            }),
            withheld_cp: None,
            withheld_irrf: Some(dec!(150.00)),
            withheld_csll: Some(dec!(100.00)),
        })
        .tax_totals(TaxTotals {
            percentages: Some(TaxSplit {
                federal: dec!(13.45),
                state: dec!(0),
                municipal: dec!(2.5),
            }),
            ..TaxTotals::default()
        })
        .build()
        .unwrap();
    dps.service.complementary = Some(ComplementaryInfo {
        technical_document: None,
        reference_document: Some("PED-2025-0042".into()),
        text: Some("Servico prestado conforme contrato 42/2025".into()),
    });
    dps
}

pub fn emitter() -> Emitter {
    Emitter {
        identification: Identification::Cnpj(PROVIDER_CNPJ.into()),
        municipal_registration: Some("12345678".into()),
        name: "Prestadora Exemplo Ltda".into(),
        trade_name: Some("Exemplo Software".into()),
        address: EmitterAddress {
            street: "Avenida Paulista".into(),
            number: "1000".into(),
            complement: Some("Conj. 101".into()),
            district: "Bela Vista".into(),
            municipality_code: SAO_PAULO.into(),
            state: "SP".into(),
            postal_code: "01310-100".into(),
        },
        phone: Some("(11) 3333-4444".into()),
        email: Some("contato@prestadora.com.br".into()),
    }
}

pub fn header() -> NfseHeader {
    NfseHeader {
        emission_location: "Sao Paulo".into(),
        service_location: "Sao Paulo".into(),
        number: "1".into(),
        incidence_municipality: SAO_PAULO.into(),
        incidence_location: Some("Sao Paulo".into()),
        national_tax_description: "Analise e desenvolvimento de sistemas".into(),
        municipal_tax_description: None,
        nbs_description: None,
        app_version: "SefinNac_1.0".into(),
        generating_environment: 2,
        emission_type: 1,
        emission_process: Some(1),
        status: 100,
        processed_at: None,
        dfse_number: "987654".into(),
    }
}

pub fn sample_nfse() -> Nfse {
    Nfse {
        version: SCHEMA_VERSION.into(),
        header: header(),
        emitter: emitter(),
        values: None,
        dps: sample_dps(),
    }
}
